//! Configuration section definitions.
//!
//! Each module corresponds to a section in `staticize.toml`:
//!
//! | Module      | TOML Section    | Purpose                                |
//! |-------------|-----------------|----------------------------------------|
//! | `site`      | `[site]`        | Site-wide metadata defaults            |
//! | `build`     | `[build]`       | Paths, bundle command, parallelism     |
//! | `crawl`     | `[crawl]`       | Headless browser settings              |
//! | `serve`     | `[serve]`       | Local server                           |
//! | `functions` | `[functions.*]` | Payment and volunteer request handlers |
//! | `routes`    | `[[routes]]`    | The route table                        |

mod build;
mod crawl;
mod functions;
mod routes;
mod serve;
mod site;

pub use build::{BuildSectionConfig, OnFailure};
pub use crawl::CrawlConfig;
pub use functions::{FunctionsConfig, PaymentConfig, VolunteerConfig};
pub use routes::{Layout, RouteConfig, Strategy, validate_routes};
pub use serve::ServeConfig;
pub use site::SiteSectionConfig;
