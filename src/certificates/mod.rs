pub mod filter;
pub mod list;
pub mod manager;
pub mod upload;

pub use filter::{filter_by_type, names_for_type};
pub use list::{ActionOutcome, CertificateList, CertificateRow, DialogState, DialogView, ListView};
pub use manager::{CertificateManager, LoadState, ManagerView};
pub use upload::{CertificateSummary, UploadError, UploadForm, ValidatedUpload, validate_upload};
