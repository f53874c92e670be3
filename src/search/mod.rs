pub mod filter;
pub mod query;
pub mod results;
pub mod uri;

pub use filter::{check_search_text, is_no_filter_market, FilterPolicy, FilterRejection, NO_FILTER_MARKET};
pub use query::{Freshness, NormalizedQuery, QueryBuilder};
pub use results::{adapt, WebPage};
pub use uri::RequestUriComposer;
