// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vatti-chart: renders the workflow chart's values document from a
//! validated launch request, and re-validates the rendered form.

mod render;
mod values;

pub use render::render_values;
pub use values::{
    CalculatorValues, ChartValues, KeyHandlerSecret, NextflowValues, RenderError, SecretValues,
};
