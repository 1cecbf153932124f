// Copyright (c) 2025 Splitledger contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod groups;
pub mod expenses;
pub mod settlements;
pub mod balances;
pub mod importer;
pub mod exporter;
pub mod doctor;
