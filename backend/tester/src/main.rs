use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Result, bail};
use clap::Parser;
use reqwest::Client;
use serde_json::{Value, json};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    url: String,

    #[arg(long, default_value_t = 10)]
    visitors: usize,

    #[arg(long, default_value_t = 3)]
    rounds: usize,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

async fn fetch_keys(client: &Client, url: &str) -> Result<Vec<String>> {
    let catalog: Vec<Value> = client
        .get(format!("{url}/catalog"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(catalog
        .iter()
        .filter_map(|item| item["key"].as_str().map(str::to_string))
        .collect())
}

/// Last plus/minus press times per item, as one visitor's browser would report them.
struct Presses<'a> {
    keys: &'a [String],
    visitor: usize,
    times: HashMap<&'a str, (u64, u64)>,
    last_voted: Option<&'a str>,
    clock: u64,
}

impl<'a> Presses<'a> {
    fn new(keys: &'a [String], visitor: usize) -> Self {
        Self {
            keys,
            visitor,
            times: HashMap::new(),
            last_voted: None,
            clock: 0,
        }
    }

    /// Plus on a rotating item, except every third round takes back the last plus.
    /// Returns the item and its `(plus, minus)` times to send.
    fn press(&mut self, round: usize, now: u64) -> (&'a str, u64, u64) {
        self.clock = now.max(self.clock + 1);

        let (item, minus) = match self.last_voted {
            Some(item) if round % 3 == 2 => (item, true),
            _ => (self.keys[(self.visitor + round) % self.keys.len()].as_str(), false),
        };

        let times = self.times.entry(item).or_default();
        if minus {
            times.1 = self.clock;
        } else {
            times.0 = self.clock;
            self.last_voted = Some(item);
        }

        (item, times.0, times.1)
    }
}

/// One visitor with its own cookie jar, returning how many votes the server accepted.
async fn visit(url: String, keys: Vec<String>, visitor: usize, rounds: usize) -> Result<usize> {
    let client = Client::builder().cookie_store(true).build()?;
    let mut presses = Presses::new(&keys, visitor);
    let mut accepted = 0;

    for round in 0..rounds {
        let (item, plus, minus) = presses.press(round, now_millis());

        let response = client
            .post(format!("{url}/vote/{item}"))
            .json(&json!({ "plus": plus, "minus": minus }))
            .send()
            .await?;

        if response.status().is_success() {
            accepted += 1;
        } else {
            println!("Visitor {visitor}: {} on {item}", response.status());
        }
    }

    Ok(accepted)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let url = args.url.trim_end_matches('/').to_string();

    let keys = fetch_keys(&Client::new(), &url).await?;
    if keys.is_empty() {
        bail!("Catalog at {url} is empty");
    }
    println!("Loaded {} items", keys.len());

    let handles: Vec<_> = (0..args.visitors)
        .map(|visitor| tokio::spawn(visit(url.clone(), keys.clone(), visitor, args.rounds)))
        .collect();

    let mut accepted = 0;
    for handle in handles {
        accepted += handle.await??;
    }
    println!("Accepted votes: {accepted}\n");

    let report: Value = Client::new()
        .get(format!("{url}/report"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
