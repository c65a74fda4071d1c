pub mod http;
pub mod parse;
pub mod search;

pub use http::http_post_json;
pub use parse::{extract_json, strip_code_fences};
pub use search::{SEARCH_TOOL_NAME, SearchTool, TavilySearch, search_tool_spec};
