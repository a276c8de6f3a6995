/*!
# Achot Report Engine

Data-entry and reporting engine for itemized "achot" reports: rows of a reason label plus
numeric cost and credit columns, totaled on every change, persisted through a report
gateway and exportable to PDF, Excel and CSV.

## Overview

Each row carries one inbound amount (`tovar`) and five outbound amounts (`ok`, `rasxod`,
`vazvirat`, `pul`, `kilik_ozi`). The row balance, called *itog*, is the inbound amount minus
the sum of the outbound ones. A report is a named, dated group of rows owned by one user.

## Architecture

### Core
- **format** - Dot-grouped display of integers and the inverse parse
- **row** - Row model, active-row filter, column sums and itog
- **grid** - Editable row list: cell edits, keyboard navigation, bulk add/delete, selection
- **marquee** - Drag-to-select rectangle with edge auto-scroll
- **draft** - Unsaved-changes flag, draft snapshot and guarded transitions

### Collaborators
- **storage** - Key-value store for drafts and preferences (memory, gzip + bincode file)
- **prefs** - Theme preference and online flag
- **gateway** - Asynchronous CRUD backend for report groups and rows
- **export** - PDF, XLSX and CSV renderers

### Orchestration
- **session** - One user's editing session tying the above together
- **config** - Environment and command-line settings
- **app** - JSON HTTP API over a session (feature `web`)

## Usage

```
use achot::grid::Grid;
use achot::row::Field;

let mut grid = Grid::new();
grid.edit_cell(0, Field::Sabablar, "Un");
grid.edit_cell(0, Field::Tovar, "1000");
grid.edit_cell(0, Field::Ok, "400");
assert_eq!(grid.totals().itog, 600);
```
*/

/// HTTP API over a report session
#[cfg(feature = "web")]
pub mod app;

/// Runtime configuration
pub mod config;

/// Unsaved-changes tracking and draft persistence
pub mod draft;

/// Crate-wide error type
pub mod error;

/// Document renderers
pub mod export;

/// Integer display formatting
pub mod format;

/// Report persistence backend
pub mod gateway;

/// Grid interaction controller
pub mod grid;

/// Drag selection
pub mod marquee;

/// UI preferences
pub mod prefs;

/// Row model and totals
pub mod row;

/// Editing session
pub mod session;

/// Durable key-value storage
pub mod storage;

pub use error::Error;
pub use format::{format_number, parse_number};
pub use row::{Field, ReportRow, Totals, aggregate_column, calculate_itog, filter_active_rows};
pub use session::ReportSession;
