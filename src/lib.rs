pub mod assemble;
pub mod combos;
pub mod config;
pub mod download;
pub mod encode;
pub mod error;
pub mod events;
pub mod filters;
pub mod http_client;
pub mod interaction;
pub mod logging;
pub mod merge;
pub mod names;
pub mod session;
pub mod table;
pub mod url;
pub mod webdriver;

pub use assemble::assemble;
pub use config::ScrapeConfig;
pub use download::{MatchData, Subject, download, download_batch, prepare};
pub use error::{EncodeError, Error, MergeError, ResolveError, Result, SessionError};
pub use filters::{Attrs, FilterKey, FilterValue, Tour};
pub use merge::{MatchTable, merge};
pub use names::{DirectoryResolver, NameResolver, PlayerDirectory};
pub use session::{Interaction, PageHandle, PageSession};
