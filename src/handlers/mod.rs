//! HTTP handlers for the Warehouse Inventory Management System

pub mod barcode;
pub mod category;
pub mod csv_io;
pub mod inventory;
pub mod notification;
pub mod product;
pub mod purchase_order;
pub mod reporting;
pub mod supplier;
pub mod warehouse;

pub use barcode::*;
pub use category::*;
pub use csv_io::*;
pub use inventory::*;
pub use notification::*;
pub use product::*;
pub use purchase_order::*;
pub use reporting::*;
pub use supplier::*;
pub use warehouse::*;
