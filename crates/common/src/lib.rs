pub mod broker;
pub mod crypto;
pub mod dispatch_id;
pub mod retry;
pub mod vuln;
