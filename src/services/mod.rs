//! Business logic services for the Warehouse Inventory Management System

pub mod category;
pub mod csv_io;
pub mod notification;
pub mod product;
pub mod purchase_order;
pub mod reporting;
pub mod stock_ledger;
pub mod supplier;
pub mod warehouse;

pub use category::CategoryService;
pub use csv_io::CsvService;
pub use notification::NotificationService;
pub use product::ProductService;
pub use purchase_order::PurchaseOrderService;
pub use reporting::ReportingService;
pub use stock_ledger::StockLedgerService;
pub use supplier::SupplierService;
pub use warehouse::WarehouseService;
