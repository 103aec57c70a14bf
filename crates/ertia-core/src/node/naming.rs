//! Random human-readable names.
//!
//! Names are cosmetic. Nothing here guarantees uniqueness; identity is the
//! node id.

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;

use crate::dns::DEFAULT_DOMAIN;

const ADJECTIVES: &[&str] = &[
    "amber", "ancient", "bold", "brave", "bright", "calm", "clever", "crimson", "daring", "eager",
    "fancy", "fierce", "gentle", "golden", "hidden", "humble", "icy", "jolly", "keen", "lively",
    "lucky", "mellow", "misty", "noble", "proud", "quiet", "rapid", "rusty", "silent", "swift",
    "tidy", "vivid", "wild", "witty",
];

const NOUNS: &[&str] = &[
    "badger", "beacon", "cedar", "comet", "coyote", "falcon", "fjord", "glacier", "harbor",
    "heron", "lynx", "maple", "meadow", "otter", "panther", "pebble", "pine", "raven", "reef",
    "river", "sparrow", "spruce", "summit", "thunder", "tiger", "tundra", "valley", "walrus",
    "willow", "wolf",
];

const TOKEN_LEN: usize = 4;
const SUB_DOMAIN_LEN: usize = 6;

/// `adjective-noun-xxxx`, the suffix being four random lowercase characters.
pub fn node_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("quiet");
    let noun = NOUNS.choose(&mut rng).copied().unwrap_or("node");
    format!("{adjective}-{noun}-{}", random_lowercase(&mut rng, TOKEN_LEN))
}

/// `.xxxxxx.ertia.cloud`; callers prepend their own label.
pub fn sub_domain() -> String {
    sub_domain_of(DEFAULT_DOMAIN)
}

/// Like [`sub_domain`] under an arbitrary parent domain.
pub fn sub_domain_of(parent: &str) -> String {
    let mut rng = rand::thread_rng();
    format!(
        ".{}.{}",
        random_lowercase(&mut rng, SUB_DOMAIN_LEN),
        parent.trim_matches('.')
    )
}

fn random_lowercase<R: Rng>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}
