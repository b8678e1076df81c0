//! Wellnest - a personal wellness tracker.
//!
//! # Overview
//!
//! Users log moods and journal entries, keep a prioritized to-do list and get
//! analytics back: a weighted productivity score per day, streaks, the most
//! productive day, category breakdowns and mood distributions.
//!
//! The analytics are pure functions of their inputs. Each one takes `now` and
//! a [`calendar::DayBoundary`] explicitly, so the same data always yields the
//! same report.
//!
//! # Modules
//!
//! - [`model`]: Tasks, mood entries and request types
//! - [`calendar`]: Day boundaries and time-range windows
//! - [`productivity`]: Productivity scoring and aggregation
//! - [`mood`]: Mood insights
//! - [`daily_pick`]: Quote of the day and today's challenge
//! - [`storage`]: SQLite storage layer
//! - [`error`]: Error types
//! - [`config`]: Environment configuration
//! - [`api`]: HTTP API handlers

pub mod api;
pub mod calendar;
pub mod config;
pub mod daily_pick;
pub mod error;
pub mod model;
pub mod mood;
pub mod productivity;
pub mod storage;
