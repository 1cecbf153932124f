// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Errors from the split calculator. An unknown split mode is the only hard
/// failure; everything else degrades through the rounding/fallback rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("unsupported split type '{0}': expected equal, percentage or custom")]
    UnsupportedSplitType(String),
}

/// Integrity errors from the balance aggregator, raised only under the
/// strict missing-member policy. Under the permissive policy the offending
/// record's contribution is skipped instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("expense {expense_id} is paid by '{user_id}', who is not a group member")]
    UnknownPayer { expense_id: i64, user_id: String },

    #[error("expense {expense_id} carries a split for '{user_id}', who is not a group member")]
    UnknownSplitMember { expense_id: i64, user_id: String },

    #[error("settlement {settlement_id} references '{user_id}', who is not a group member")]
    UnknownSettlementParty { settlement_id: i64, user_id: String },
}
