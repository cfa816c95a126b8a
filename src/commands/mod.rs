// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod balance;
pub mod categories;
pub mod exporter;
pub mod ledger;
pub mod obligations;
pub mod reconcile;
pub mod report;

use crate::engine::Outcome;
use uuid::Uuid;

/// Client-generated request id: taken from `--request-id` when the caller is
/// retrying, freshly minted otherwise.
pub(crate) fn request_id(m: &clap::ArgMatches) -> String {
    m.get_one::<String>("request-id")
        .cloned()
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub(crate) fn report_outcome(outcome: Outcome, request_id: &str, what: &str) {
    match outcome {
        Outcome::Applied => println!("{} (request {})", what, request_id),
        Outcome::Duplicate => {
            println!("Request {} was already applied; nothing to do", request_id)
        }
    }
}
