use std::collections::BTreeMap;

use serde::Serialize;

/// Response status codes produced so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseStatistics {
    pub last_response_code: Option<u16>,
    pub response_codes: BTreeMap<u16, u64>,
}

impl ResponseStatistics {
    pub fn add_response_code(&mut self, code: u16) {
        self.last_response_code = Some(code);
        *self.response_codes.entry(code).or_default() += 1;
    }

    /// Responses with a 5xx status.
    pub fn server_errors(&self) -> u64 {
        self.response_codes.range(500..600).map(|(_, count)| count).sum()
    }
}
