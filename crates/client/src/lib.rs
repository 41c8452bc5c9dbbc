pub mod http;
pub mod port_file;
pub mod response;

pub use http::{BackendConfig, HttpAttemptApi, SystemInfo};
pub use port_file::{discover_base_url, port_file_path, read_port_file, DEFAULT_BASE_URL};
pub use response::ApiResponse;
