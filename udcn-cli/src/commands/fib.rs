//! Builds an in-process `udcn_forwarder::Fib` from the routes given on the
//! command line and prints its longest-prefix-match table. There is no
//! persistent forwarding daemon in this workspace, so a table can only ever
//! reflect routes registered within the same invocation — not prior ones.

use anyhow::{bail, Context, Result};
use log::info;
use udcn_common::ndn::{FaceId, Name};
use udcn_forwarder::fib::Fib;
use udcn_forwarder::name_tree::NameTree;

pub fn handle_command(routes: Vec<String>, lookup: Option<String>) -> Result<()> {
    let mut tree = NameTree::new();
    let mut fib = Fib::new();

    if routes.is_empty() {
        println!("No routes given; pass --route <prefix>:<face>[:<cost>] one or more times.");
    }

    for spec in &routes {
        let (prefix, face, cost) = parse_route(spec)?;
        fib.register(&mut tree, &prefix, face, cost);
        info!("registered route prefix={prefix} face={} cost={cost}", face.0);
    }

    println!("FIB table ({} prefixes):", fib.len());
    for (node, entry) in fib.entries() {
        let name = tree.name_of(node);
        let hops: Vec<String> = entry
            .next_hops
            .iter()
            .map(|h| format!("face {} (cost {})", h.face.0, h.cost))
            .collect();
        println!("  {name} -> {}", hops.join(", "));
    }

    if let Some(name_str) = lookup {
        let name = Name::from_uri(&name_str).context("parsing lookup name")?;
        match fib.longest_prefix_match(&tree, &name) {
            Some(entry) => {
                let hops: Vec<String> = entry
                    .next_hops
                    .iter()
                    .map(|h| format!("face {} (cost {})", h.face.0, h.cost))
                    .collect();
                println!("lookup {name} -> {}", hops.join(", "));
            }
            None => println!("lookup {name} -> no match"),
        }
    }

    Ok(())
}

fn parse_route(spec: &str) -> Result<(Name, FaceId, u32)> {
    let mut parts = spec.split(':');
    let prefix_str = parts.next().context("empty route spec")?;
    let face_str = match parts.next() {
        Some(f) => f,
        None => bail!("route \"{spec}\" is missing a face id (expected PREFIX:FACE[:COST])"),
    };
    let cost = match parts.next() {
        Some(c) => c.parse::<u32>().with_context(|| format!("parsing cost in route \"{spec}\""))?,
        None => 10,
    };
    if parts.next().is_some() {
        bail!("route \"{spec}\" has too many ':'-separated fields");
    }

    let prefix = Name::from_uri(prefix_str).with_context(|| format!("parsing prefix in route \"{spec}\""))?;
    let face = face_str
        .parse::<u32>()
        .with_context(|| format!("parsing face id in route \"{spec}\""))?;
    Ok((prefix, FaceId(face), cost))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefix_face_and_cost() {
        let (prefix, face, cost) = parse_route("/a:1:20").unwrap();
        assert_eq!(prefix, Name::from_uri("/a").unwrap());
        assert_eq!(face, FaceId(1));
        assert_eq!(cost, 20);
    }

    #[test]
    fn defaults_cost_when_omitted() {
        let (_, _, cost) = parse_route("/a:1").unwrap();
        assert_eq!(cost, 10);
    }

    #[test]
    fn rejects_a_route_missing_a_face() {
        assert!(parse_route("/a").is_err());
    }
}
