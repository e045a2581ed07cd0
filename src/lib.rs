// Rampart - validators for web application input
//
// This library bundles small, independent validators that answer a yes/no
// question about a value and explain every "no" through keyed messages.

// Re-export core validators
pub use rampart_validation::*;

// Re-export optional crates
#[cfg(feature = "files")]
pub use rampart_files;

#[cfg(feature = "files")]
pub use rampart_files::{ExcludeMimeType, FileDescriptor, FileInput, UploadArray, file_information};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Bitwise, HasMessages, Identical, Messages, Operator, ValidationContext, Validator,
        ValidatorError,
    };

    #[cfg(feature = "files")]
    pub use crate::{ExcludeMimeType, FileInput, UploadArray};
}
