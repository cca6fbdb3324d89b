// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod food;
pub mod goals;
pub mod intake;
pub mod user;

pub use food::{FoodItem, Per100};
pub use goals::{Goals, GoalsPatch, MacroTotals, Progress};
pub use intake::{IntakeEntry, NewIntakeEntry};
pub use user::{Role, UserProfile};
