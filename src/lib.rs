pub mod models;
pub mod error;
pub mod config;
pub mod classifier;
pub mod engine;
pub mod transport;
pub mod payment;
pub mod wallet;
pub mod tools;
pub mod reporting;
pub mod mcp;

// Re-export commonly used items
pub use models::*;
pub use error::{ApiError, PaymentError, StartupError, ToolError};
pub use config::Config;
pub use classifier::classify;
pub use engine::{build_url, connect, ApiInvoker};
pub use transport::{HttpResponse, HttpTransport, PaymentTransport, Transport};
pub use payment::PaymentSigner;
pub use wallet::WalletSigner;
pub use tools::{find_tool, ToolDispatcher, TOOLS};
pub use reporting::{format_error, format_result, ToolReply};
pub use mcp::{run_stdio, McpServer};
