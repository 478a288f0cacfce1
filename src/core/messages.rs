//! Default user-facing strings.

pub const CERTIFICATE_ADDED: &str = "Certificate added successfully";
pub const CERTIFICATE_ADD_FAILED: &str =
    "Something went wrong while adding the Application certificate";
pub const CERTIFICATE_DELETED: &str = "Certificate Deleted Successfully";
pub const CERTIFICATE_DELETE_FAILED: &str = "Something went wrong while deleting the certificate";
pub const CERTIFICATE_DETAILS_FAILED: &str =
    "Something went wrong while retrieving the certificate details";
pub const CERTIFICATES_LOAD_FAILED: &str =
    "Something went wrong while retrieving the Application certificates";
pub const NO_CERTIFICATES: &str = "You do not have any certificates uploaded";

pub const APPLICATION_UPDATED: &str = "Application updated successfully";
pub const APPLICATION_UPDATE_FAILED: &str = "Error while updating the application";
pub const APPLICATION_NOTHING_TO_RESTORE: &str = "There is no previous version of the application to restore";

pub const CERTIFICATES_TITLE: &str = "Certificate Management";
pub const CERTIFICATES_SUBTITLE: &str =
    "Attach certificates to application to deploy in the Gateway";
