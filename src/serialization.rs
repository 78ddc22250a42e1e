//! Single-bot text interchange format (component C8).
//!
//! One line, whitespace-separated: `<1> <ip> <age> <1> <color_u32> <g0> ...
//! <g255>`. The two `1`s are literal format-version tags (bot envelope,
//! species envelope); position, rotation and energy are not carried and must
//! be supplied by the load site.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::species::{Species, GENOME_LEN};

/// The fields a saved-bot line actually carries. Position, rotation and
/// energy are the load site's responsibility (spec.md's reference harness
/// sets energy to the starting value).
pub struct LoadedBot {
    pub ip: u8,
    pub age: u32,
    pub species: Rc<Species>,
}

/// Render `ip`, `age` and `species` as one saved-bot line, no trailing newline.
pub fn save_bot(ip: u8, age: u32, species: &Species) -> String {
    let color_u32 = u32::from_be_bytes(species.color);
    let mut line = format!("1 {ip} {age} 1 {color_u32}");
    for i in 0..GENOME_LEN {
        line.push(' ');
        line.push_str(&species.gene(i).to_string());
    }
    line
}

/// Parse one saved-bot line. Fails on truncation, malformed integers, an
/// unrecognised version tag, or trailing tokens.
pub fn load_bot(line: &str) -> Result<LoadedBot> {
    let mut tokens = line.split_whitespace();

    expect_version(next_token(&mut tokens, "bot version")?)?;
    let ip: u8 = parse_token(next_token(&mut tokens, "ip")?, "ip")?;
    let age: u32 = parse_token(next_token(&mut tokens, "age")?, "age")?;
    expect_version(next_token(&mut tokens, "species version")?)?;
    let color_u32: u32 = parse_token(next_token(&mut tokens, "color")?, "color")?;

    let mut genome = [0u16; GENOME_LEN];
    for (i, gene) in genome.iter_mut().enumerate() {
        *gene = parse_token(next_token(&mut tokens, "gene")?, &format!("gene {i}"))?;
    }

    if tokens.next().is_some() {
        return Err(fail("trailing tokens after genome".to_string()));
    }

    Ok(LoadedBot {
        ip,
        age,
        species: Species::from_parts(color_u32.to_be_bytes(), genome, 0),
    })
}

fn next_token<'a>(tokens: &mut std::str::SplitWhitespace<'a>, what: &str) -> Result<&'a str> {
    tokens.next().ok_or_else(|| fail(format!("truncated before {what}")))
}

fn expect_version(token: &str) -> Result<()> {
    if token == "1" {
        Ok(())
    } else {
        Err(fail(format!("unsupported format version {token}")))
    }
}

fn parse_token<T: std::str::FromStr>(token: &str, what: &str) -> Result<T> {
    token.parse().map_err(|_| fail(format!("invalid {what}: {token:?}")))
}

fn fail(message: String) -> Error {
    log::warn!("bot deserialization failed: {message}");
    Error::BotLoad(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn round_trips_ip_age_and_genome() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let species = Species::random(&mut rng, 3);
        let line = save_bot(42, 7, &species);
        let loaded = load_bot(&line).unwrap();
        assert_eq!(loaded.ip, 42);
        assert_eq!(loaded.age, 7);
        assert_eq!(loaded.species.color, species.color);
        assert_eq!(Species::difference(&species, &loaded.species), 0);
    }

    #[test]
    fn rejects_truncated_lines() {
        assert!(load_bot("1 0 0 1 4278190335 1 2 3").is_err());
    }

    #[test]
    fn rejects_unsupported_version() {
        assert!(load_bot(&format!("2 0 0 1 0{}", " 0".repeat(GENOME_LEN))).is_err());
    }

    #[test]
    fn rejects_trailing_tokens() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let species = Species::random(&mut rng, 0);
        let mut line = save_bot(0, 0, &species);
        line.push_str(" 99");
        assert!(load_bot(&line).is_err());
    }

    #[test]
    fn rejects_non_integer_tokens() {
        assert!(load_bot(&format!("1 x 0 1 0{}", " 0".repeat(GENOME_LEN))).is_err());
    }
}
