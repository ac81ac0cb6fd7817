// Keymerge - Login Model
//
// The normalized password record shared by the keychain adapter, the
// reconciler and the metadata store, plus signon realm decomposition.

mod realm;
mod record;

pub use realm::RealmParts;
pub use record::{LoginSummary, PasswordRecord, RecordSource, Scheme, BLACKLIST_PLACEHOLDER};
