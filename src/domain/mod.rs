pub mod checkout;
pub mod course;
pub mod entitlement;
pub mod ports;
pub mod principal;
pub mod subscription;
