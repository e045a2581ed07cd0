//! Validators for Rampart
//!
//! Small, independent predicate objects for web input. Each validator keeps
//! its configuration, answers `is_valid`, and explains a `false` answer
//! through [`Messages`] keyed by error code. Messages always describe the
//! most recent call only.
//!
//! # Examples
//!
//! ## Bit flags
//!
//! ```
//! use rampart_validation::{Bitwise, Operator};
//!
//! let mut permissions = Bitwise::new(0b0110, Operator::Xor, false);
//! assert!(permissions.is_valid(0b1001));
//! assert!(!permissions.is_valid(0b0010));
//! assert_eq!(
//!     permissions.messages().get(Bitwise::NOT_XOR),
//!     Some("The input has common bit set with '6'")
//! );
//! ```
//!
//! ## Cross-field comparison
//!
//! ```
//! use rampart_validation::{Identical, ValidationContext};
//! use serde_json::{json, Value};
//!
//! let mut same_email = Identical::new(json!(["user", "email"]));
//! let context: Value = ValidationContext::new()
//!     .with_data("user", json!({ "email": "a@example.com" }))
//!     .into();
//!
//! assert!(same_email.is_valid(&json!("a@example.com"), Some(&context)).unwrap());
//! assert!(!same_email.is_valid(&json!("b@example.com"), Some(&context)).unwrap());
//! assert!(same_email.messages().contains_key(Identical::NOT_SAME));
//! ```
//!
//! ## Options from configuration
//!
//! ```
//! use rampart_validation::{Bitwise, Operator};
//! use serde_json::json;
//!
//! let validator = Bitwise::from_value(json!({
//!     "control": 7,
//!     "operator": "and",
//!     "strict": true,
//!     "messages": { "notAndStrict": "Unknown permission bits" }
//! }))
//! .unwrap();
//! assert_eq!(validator.operator(), Some(Operator::And));
//! ```

mod bitwise;
mod errors;
mod identical;
mod messages;
mod traits;

pub use bitwise::*;
pub use errors::*;
pub use identical::*;
pub use messages::*;
pub use traits::*;
