use super::schema::Config;
use crate::errors::RelayError;
use std::fmt::Display;
use std::str::FromStr;

macro_rules! define_env_overrides {
    (@value string, $env:literal, $val:ident) => {
        $val
    };
    (@value optional, $env:literal, $val:ident) => {
        Some($val)
    };
    (@value number, $env:literal, $val:ident) => {
        parse_env_value($env, &$val)?
    };
    (@value list, $env:literal, $val:ident) => {
        parse_env_list(&$val)
    };

    ($( $env:literal => $($path:ident).+ : $kind:ident );* $(;)?) => {
        /// Every environment variable that can override a config field.
        pub const ENV_VARS: &[&str] = &[$($env),*];

        /// Apply overrides using `lookup` to resolve variable names.
        ///
        /// Variables that are unset or blank leave the config untouched.
        /// Numeric variables that fail to parse are configuration errors.
        pub fn apply_env_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), RelayError>
        where
            F: Fn(&str) -> Option<String>,
        {
            $(
                if let Some(val) = lookup($env).filter(|v| !v.trim().is_empty()) {
                    let val = val.trim().to_string();
                    config.$($path).+ = define_env_overrides!(@value $kind, $env, val);
                }
            )*
            Ok(())
        }
    };
}

define_env_overrides! {
    // Secrets
    "TELEGRAM_BOT_TOKEN"        => telegram.token: string;
    "OPENAI_API_KEY"            => provider.api_key: string;
    // Channel
    "ALLOWED_TELEGRAM_USER_IDS" => telegram.allow_from: list;
    // Provider
    "OPENAI_API_BASE"           => provider.api_base: optional;
    "REQUEST_TIMEOUT_SECS"      => provider.request_timeout_secs: number;
    "MAX_RETRIES"               => provider.max_retries: number;
    // Generation
    "OPENAI_MODEL"              => generation.model: string;
    "MAX_TOKENS"                => generation.max_tokens: number;
    "TEMPERATURE"               => generation.temperature: number;
    "PRESENCE_PENALTY"          => generation.presence_penalty: number;
    "FREQUENCY_PENALTY"         => generation.frequency_penalty: number;
    "SYSTEM_PROMPT"             => generation.system_prompt: string;
}

fn parse_env_value<T>(name: &str, raw: &str) -> Result<T, RelayError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>()
        .map_err(|e| RelayError::Config(format!("{name}={raw:?} is not valid: {e}")))
}

fn parse_env_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
