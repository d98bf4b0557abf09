//! Domain types: quotes, stocks, per-stock events, breadth context, trades.

pub mod breadth;
pub mod events;
pub mod quote;
pub mod stock;
pub mod trade;

pub use breadth::{BreadthContext, BreadthPoint};
pub use events::{Earning, OrderBlock, OrderBlockKind};
pub use quote::{EmaSet, Quote, RawQuote, Trend};
pub use stock::{Stock, StockError};
pub use trade::{Excursion, Trade};
