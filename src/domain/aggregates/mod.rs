//! Aggregates module
pub mod address;
pub mod customer;
pub mod notification;
pub mod order;
pub mod refund;
pub mod shipping;
pub mod shipstation;
pub mod subscription;

pub use address::Address;
pub use customer::Customer;
pub use notification::Notification;
pub use order::{CustomField, Item, Order, OrderStatus, PaymentStatus};
pub use refund::Refund;
pub use shipping::{Package, ShippingRate};
pub use shipstation::{CreatedOrder, ShipStationAddress, ShipStationOrder, ShipStationOrderItem, ShipStationRate, TEST_ORDER_ID};
pub use subscription::{Schedule, Subscription};
