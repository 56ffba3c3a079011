// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Warnings by default, debug for this crate with `--verbose`; `RUST_LOG` wins.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "warn,budgettogether=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
