mod airport;
mod flight;
mod ticket;

pub use airport::{Airport, City};
pub use flight::{Flight, FlightId};
pub use ticket::{Ticket, TicketId};
