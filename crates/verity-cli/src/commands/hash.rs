//! hash command - encode a password in the form a directory stores it

use super::CommandContext;
use anyhow::{bail, Result};
use serde::Serialize;
use std::process::ExitCode;
use verity_auth::encoding_from_config;
use verity_core::config::{EncodingConfig, EncodingScheme, HashAlgorithmName};
use verity_crypto::PasswordEncoding;

#[derive(Serialize)]
struct HashResult<'a> {
    scheme: &'a str,
    value: String,
}

pub fn execute(
    ctx: &CommandContext,
    scheme: EncodingScheme,
    algorithm: HashAlgorithmName,
    salt_length: usize,
    lowercase: bool,
    password: &str,
) -> Result<ExitCode> {
    let encoding = encoding_from_config(&EncodingConfig {
        scheme,
        algorithm,
        lowercase_prefix: lowercase,
    });

    let value = encode(&encoding, salt_length, password)?;

    if ctx.is_json() {
        ctx.print_json(&HashResult {
            scheme: encoding.name(),
            value,
        })?;
    } else {
        println!("{}", value);
    }

    Ok(ExitCode::SUCCESS)
}

fn encode(encoding: &PasswordEncoding, salt_length: usize, password: &str) -> Result<String> {
    match encoding {
        PasswordEncoding::SaltedDigest(codec) => {
            if salt_length == 0 {
                bail!("Salt length must be at least 1 byte for the salted scheme");
            }
            Ok(codec.encode_with_random_salt(password, salt_length))
        }
        PasswordEncoding::PlainDigest(codec) => Ok(codec.encode(password, None)),
        PasswordEncoding::Plaintext => Ok(password.to_string()),
    }
}
