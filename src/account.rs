//! Chain accounts and their keys.
//!
//! Keys of every account other than the built-in `initminer` are derived
//! deterministically by the `get_dev_key` executable from a shared secret and
//! the account name.

use crate::utils::binary::{BinaryError, PathsToExecutables, GET_DEV_KEY};
use log::debug;
use serde::{Deserialize, Serialize};
use std::process::Command;

/// Secret every development key is derived from
pub const DEV_KEY_SECRET: &str = "secret";

pub const INITMINER_NAME: &str = "initminer";
pub const INITMINER_PRIVATE_KEY: &str = "5JNHfZYKGaomSFvd4NUdQ9qMcEAC43kujbfjueTHpVapX1Kzq2n";
pub const INITMINER_PUBLIC_KEY: &str = "TST6LLegbAgLAy28EHrffBVuANFWcFgmqRMW13wBmTExqFE9SCkg4";

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Binary(#[from] BinaryError),

    #[error("Failed to run get_dev_key: {0}")]
    Io(#[from] std::io::Error),

    #[error("get_dev_key exited with {status}: {stderr}")]
    KeyGeneration { status: String, stderr: String },

    #[error("Unexpected get_dev_key output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Account name with its key pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "account_name")]
    pub name: String,
    pub private_key: String,
    pub public_key: String,
}

impl Account {
    /// The account that produces the first blocks of every test chain
    pub fn initminer() -> Self {
        Self {
            name: INITMINER_NAME.to_string(),
            private_key: INITMINER_PRIVATE_KEY.to_string(),
            public_key: INITMINER_PUBLIC_KEY.to_string(),
        }
    }

    pub fn generate(paths: &PathsToExecutables, name: &str) -> Result<Self, AccountError> {
        let mut accounts = Self::generate_many(paths, &[name])?;
        accounts.pop().ok_or_else(|| AccountError::KeyGeneration {
            status: "success".to_string(),
            stderr: format!("no key printed for {}", name),
        })
    }

    /// Derive keys of several accounts with a single `get_dev_key` call.
    pub fn generate_many<S: AsRef<str>>(
        paths: &PathsToExecutables,
        names: &[S],
    ) -> Result<Vec<Self>, AccountError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let executable = paths.get_path_of(GET_DEV_KEY)?;
        let names: Vec<&str> = names.iter().map(|name| name.as_ref()).collect();
        debug!("Deriving keys of {} account(s) with {:?}", names.len(), executable);

        let output = Command::new(&executable)
            .arg(DEV_KEY_SECRET)
            .args(&names)
            .output()?;

        if !output.status.success() {
            return Err(AccountError::KeyGeneration {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        parse_keys(&output.stdout)
    }
}

fn parse_keys(stdout: &[u8]) -> Result<Vec<Account>, AccountError> {
    Ok(serde_json::from_slice(stdout)?)
}
