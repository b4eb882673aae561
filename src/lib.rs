/*!
# Panel Sheets

A small web backend that proxies one Google Sheets spreadsheet to a
browser-based dashboard.

## Overview

The dashboard frontend never talks to Google directly. This service fetches
rows of a named tab (with per-cell background colors), normalizes them into
a stable snapshot shape, keeps that snapshot in an in-memory cache for a
fixed window, and serves it through a handful of JSON endpoints: full
color-aware data, metadata only, and paginated chunks for incremental
loading.

## Architecture

Control flow for a request:

request -> cache lookup by sheet name -> on miss/expiry: credential loader
-> Sheets API fetch -> normalizer -> cache store -> response shaping
(full snapshot, metadata, or paginated slice).

The source spreadsheet is strictly read-only and nothing is persisted
beyond process memory.

## Modules

- **config**: environment-driven configuration with documented defaults
- **error**: error taxonomy and the single error-to-HTTP translation layer
- **auth**: service-account credential loading and token exchange
- **fetcher**: Sheets v4 grid reads and the `SheetSource` trait seam
- **snapshot**: snapshot value type, normalizer, color conversion
- **cache**: per-sheet snapshot cache with a freshness window
- **query**: pagination over a snapshot
- **app**: axum router, application state and request handlers

## REST API Endpoints

- `/api/agents/meta` - headers, row count and version of the agents tab
- `/api/agents/chunk?start=&size=` - one page of agent rows
- `/api/agents` - agent names with their sheet row numbers
- `/api/agent?row=` - headers plus one full row
- `/api/metricas-pic/data` - color-aware rows of the metrics tab
- `/api/matriz-noviembre/data` - color-aware rows of the matrix tab
- `/health` - liveness probe
*/

pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod query;
pub mod snapshot;

/// Re-export the types most callers need directly
pub use cache::SnapshotCache;
pub use config::Config;
pub use error::AppError;
pub use fetcher::{GoogleSheetSource, SheetSource};
pub use query::{Page, page};
pub use snapshot::{ColoredCell, Snapshot, normalize};
