//! Device-class vocabulary for JOI code generation.
//!
//! Parses the service-document file describing every controllable device
//! class (tags, enums, values, methods), and derives from a site's connected
//! devices which auxiliary tags travel with which class. The derived tags are
//! written into a per-request copy of the class docs so the generator sees
//! the rooms and groups that actually exist.

pub mod error;
pub mod tags;
pub mod vocabulary;

pub use error::{CatalogError, CatalogResult};
pub use tags::{SiteTags, TagDeviceMap, resolve_tags};
pub use vocabulary::{DeviceClass, Vocabulary, parse_service_list};
