//! Value Objects for orders crossing the Snipcart/ShipStation boundary

use serde::{Deserialize, Serialize};
use std::fmt;

/// Snipcart invoice number, the key that joins an order across systems
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub fn new(value: impl Into<String>) -> Result<Self, InvoiceNumberError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(InvoiceNumberError::Empty); }
        if value.len() > 50 { return Err(InvoiceNumberError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = InvoiceNumberError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<InvoiceNumber> for String {
    fn from(value: InvoiceNumber) -> Self { value.0 }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum InvoiceNumberError { Empty, TooLong }
impl std::error::Error for InvoiceNumberError {}
impl fmt::Display for InvoiceNumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "invoice number empty"), Self::TooLong => write!(f, "invoice number too long") }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Grams,
    Ounces,
    Pounds,
}

/// Weight value object in the shape ShipStation expects
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Weight { pub value: f64, pub units: WeightUnit }

impl Weight {
    pub fn grams(value: f64) -> Self { Self { value, units: WeightUnit::Grams } }
    pub fn to_grams(&self) -> f64 {
        match self.units {
            WeightUnit::Grams => self.value,
            WeightUnit::Ounces => self.value * 28.349_523_125,
            WeightUnit::Pounds => self.value * 453.592_37,
        }
    }
    pub fn is_zero(&self) -> bool { self.value == 0.0 }
}
