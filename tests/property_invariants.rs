use std::collections::BTreeMap;

use proptest::prelude::*;

use m17routes::{
    core::store::RouteMap,
    persist::hostfile::{merge_text, render_override, LoadPolicy},
    types::split_base,
};

#[derive(Debug, Clone)]
enum Action {
    Update { base: u8, suffix: u8, ip: u8, port: u16, with_url: bool },
    Malformed { idx: u8 },
    Erase { base: u8, suffix: u8 },
}

const SUFFIXES: [&str; 4] = [" A", "/B", ".C", " D/E"];

fn callsign(base: u8, suffix: u8) -> String {
    format!("K{base}AA{}", SUFFIXES[usize::from(suffix) % SUFFIXES.len()])
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u8..12, 0u8..4, any::<u8>(), any::<u16>(), any::<bool>()).prop_map(
            |(base, suffix, ip, port, with_url)| Action::Update { base, suffix, ip, port, with_url }
        ),
        (0u8..6).prop_map(|idx| Action::Malformed { idx }),
        (0u8..12, 0u8..4).prop_map(|(base, suffix)| Action::Erase { base, suffix }),
    ]
}

fn malformed(idx: u8) -> &'static str {
    ["AB/C", "N7TAE", "", " K1AA", "K1.AA/B", "a b"][usize::from(idx) % 6]
}

proptest! {
    #[test]
    fn random_sequences_match_reference_model(
        actions in prop::collection::vec(action_strategy(), 1..200)
    ) {
        let mut map = RouteMap::new();
        let mut aliases = BTreeMap::<String, String>::new();
        let mut hosts = BTreeMap::<String, (Option<String>, Option<String>, u16)>::new();

        for action in actions {
            match action {
                Action::Update { base, suffix, ip, port, with_url } => {
                    let call = callsign(base, suffix);
                    let url = if with_url { "m17.example.org" } else { "" };
                    let ip4 = format!("192.0.2.{ip}");
                    let stored = map.update(&call, url, &ip4, "none", port);

                    let expected_base = aliases
                        .entry(call.clone())
                        .or_insert_with(|| split_base(&call).unwrap_or_default().to_string())
                        .clone();
                    prop_assert_eq!(stored.as_deref(), Some(expected_base.as_str()));
                    let url = with_url.then(|| url.to_string());
                    hosts.insert(expected_base, (url, Some(ip4), port));
                }
                Action::Malformed { idx } => {
                    let before = map.len();
                    prop_assert_eq!(map.update(malformed(idx), "", "192.0.2.1", "", 1), None);
                    prop_assert_eq!(map.len(), before);
                }
                Action::Erase { base, suffix } => {
                    let call = callsign(base, suffix);
                    prop_assert_eq!(map.erase(&call), aliases.remove(&call).is_some());
                }
            }

            prop_assert_eq!(map.len(), aliases.len());
            for (call, base) in &aliases {
                let host = map.find(call).expect("alias resolves");
                let (url, ip4, port) = &hosts[base];
                prop_assert_eq!(&host.url, url);
                prop_assert_eq!(&host.ip4addr, ip4);
                prop_assert_eq!(host.ip6addr.as_deref(), None);
                prop_assert_eq!(host.port, *port);
                prop_assert_eq!(map.find_base(call), Some(host));
            }
        }

        let (body, written) = render_override(&map);
        let mut reloaded = RouteMap::new();
        let path = std::path::Path::new("M17Hosts.cfg");
        let stats = merge_text(&mut reloaded, path, &body, LoadPolicy::FailFast)
            .expect("rendered override parses");
        prop_assert_eq!(stats.applied, written);

        for (call, base) in &aliases {
            let (url, ip4, port) = &hosts[base];
            match (url, reloaded.find(call)) {
                (Some(_), found) => prop_assert!(found.is_none()),
                (None, Some(host)) => {
                    prop_assert_eq!(&host.ip4addr, ip4);
                    prop_assert_eq!(host.port, *port);
                }
                (None, None) => prop_assert!(false, "direct alias {} not saved", call),
            }
        }
    }
}
