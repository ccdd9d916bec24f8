//! Demo fixtures seeded with `--seed`: enough airports, a client, and a
//! couple of flights owned by this node for a manual end-to-end smoke test.

use airline::model::{Airport, City, Flight};
use airline::store::Client;
use uuid::Uuid;

use crate::context::Context;
use crate::error::Result;

fn airports() -> Vec<Airport> {
    vec![
        Airport {
            id: "GRU".into(),
            name: "Guarulhos International".into(),
            city: City {
                name: "Sao Paulo".into(),
                state: "SP".into(),
                country: "Brazil".into(),
                latitude: -23.4356,
                longitude: -46.4731,
            },
        },
        Airport {
            id: "JFK".into(),
            name: "John F. Kennedy International".into(),
            city: City {
                name: "New York".into(),
                state: "NY".into(),
                country: "USA".into(),
                latitude: 40.6413,
                longitude: -73.7781,
            },
        },
        Airport {
            id: "LHR".into(),
            name: "Heathrow".into(),
            city: City {
                name: "London".into(),
                state: "".into(),
                country: "United Kingdom".into(),
                latitude: 51.4700,
                longitude: -0.4543,
            },
        },
    ]
}

fn clients() -> Vec<Client> {
    vec![Client {
        id: Uuid::new_v4(),
        username: "demo".into(),
        password: "demo".into(),
        name: "Demo Traveler".into(),
    }]
}

fn flights(company: &str) -> Vec<Flight> {
    vec![
        Flight {
            id: 0,
            unique_id: format!("{company}-GRU-JFK"),
            company: company.to_string(),
            origin: "GRU".into(),
            destination: "JFK".into(),
            price: 92000,
            seats: 4,
        },
        Flight {
            id: 0,
            unique_id: format!("{company}-JFK-LHR"),
            company: company.to_string(),
            origin: "JFK".into(),
            destination: "LHR".into(),
            price: 54000,
            seats: 6,
        },
    ]
}

/// Load the demo fixture set into whichever stores the node was configured
/// with. Flights are upserted (not blindly inserted) so re-running with
/// `--seed` against an existing sqlite file is idempotent.
pub async fn seed(ctx: &Context) -> Result<()> {
    {
        let mut airport_store = ctx.airports.lock().await;
        airport_store.seed(airports())?;
    }
    {
        let mut client_store = ctx.clients.lock().await;
        client_store.seed(clients())?;
    }
    {
        let mut flight_store = ctx.flights.lock().await;
        for flight in flights(&ctx.config.name) {
            flight_store.upsert(flight)?;
        }
    }
    tracing::info!(company = %ctx.config.name, "seeded demo fixtures");
    Ok(())
}
