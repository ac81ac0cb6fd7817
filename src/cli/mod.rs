// Keymerge - CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: add, logins, remove, import.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::login::Scheme;

pub use commands::execute;

/// Keymerge - saved logins reconciled across the keychain and a metadata database.
#[derive(Parser, Debug)]
#[command(name = "keymerge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the metadata database (overrides KEYMERGE_DATA_DIR).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keyring service name for stored items (overrides KEYMERGE_KEYCHAIN_SERVICE).
    #[arg(long, global = true)]
    pub keychain_service: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save a login: the password goes to the keychain, everything else to the database.
    Add {
        /// Signon realm (e.g., "https://example.com/" or "example.com").
        #[arg(long)]
        realm: String,

        /// Authentication scheme: html, basic, digest or other.
        #[arg(long, default_value = "html")]
        scheme: Scheme,

        /// Account name. Empty for password-only logins.
        #[arg(long, default_value = "")]
        username: String,

        /// The password.
        /// For production use, prefer interactive entry to avoid shell history exposure.
        #[arg(long)]
        password: Option<String>,

        /// Page the login form was found on. Defaults to the realm.
        #[arg(long)]
        origin: Option<String>,

        /// URL the login form submits to.
        #[arg(long)]
        action: Option<String>,

        /// Name of the form's submit element.
        #[arg(long)]
        submit_element: Option<String>,

        /// Record the site as "never save" instead of storing a password.
        #[arg(long, default_value = "false")]
        never_save: bool,
    },

    /// Show the logins for a realm (passwords are never printed).
    Logins {
        /// Signon realm to look up.
        realm: String,

        #[arg(long, default_value = "html")]
        scheme: Scheme,

        /// Print JSON instead of a table.
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Remove a login from both the keychain and the database.
    Remove {
        /// Signon realm of the login.
        realm: String,

        #[arg(long, default_value = "html")]
        scheme: Scheme,

        #[arg(long, default_value = "")]
        username: String,
    },

    /// Record metadata for logins that so far exist only in the keychain.
    Import {
        /// Signon realm to import.
        realm: String,

        #[arg(long, default_value = "html")]
        scheme: Scheme,
    },
}

// ─── Tests ───────────────────────────────────────────────────────────────────
