// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod audit;
pub mod calculate;
pub mod chain;
pub mod clients;
pub mod config;
pub mod contracts;
pub mod doctor;
pub mod documents;
pub mod exporter;
pub mod reports;
