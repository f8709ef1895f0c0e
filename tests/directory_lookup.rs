use std::{sync::Arc, thread};

use m17routes::{core::directory::RouteDirectory, persist::hostfile::HostFiles};
use tempfile::TempDir;

fn directory() -> (TempDir, RouteDirectory) {
    let tmp = TempDir::new().expect("tmp");
    let dir = RouteDirectory::new(HostFiles::in_dir(tmp.path()));
    (tmp, dir)
}

#[test]
fn update_then_find_returns_normalized_record() {
    let (_tmp, dir) = directory();
    let base = dir.update("M17-USA A", "", "192.0.2.1", "none", 0);
    assert_eq!(base.as_deref(), Some("M17-USA"));

    let host = dir.find("M17-USA A").expect("record");
    assert_eq!(host.url, None);
    assert_eq!(host.ip4addr.as_deref(), Some("192.0.2.1"));
    assert_eq!(host.ip6addr, None);
    assert_eq!(host.port, 0);
}

#[test]
fn malformed_callsigns_are_dropped() {
    let (_tmp, dir) = directory();
    dir.update("N7TAE/A", "", "192.0.2.1", "", 17000);
    let keys_before = dir.keys();

    for bad in ["AB/C", "N7TAE", "", " ABC", "X.Y"] {
        assert_eq!(dir.update(bad, "", "192.0.2.2", "", 1), None);
    }

    assert_eq!(dir.len(), 1);
    assert_eq!(dir.keys(), keys_before);
}

#[test]
fn find_and_find_base_agree_for_registered_alias() {
    let (_tmp, dir) = directory();
    dir.update("ABC123/A", "", "192.0.2.1", "", 17000);

    let exact = dir.find("ABC123/A").expect("exact");
    let base = dir.find_base("ABC123/A").expect("base");
    assert!(Arc::ptr_eq(&exact, &base));

    assert!(dir.find_base("ABC123 Z").is_some());
    assert!(dir.find_base("ABC123").is_some());
    assert!(dir.find("ABC123 Z").is_none());
    assert!(dir.find_base("AB/123").is_none());
}

#[test]
fn aliases_sharing_a_base_see_last_write() {
    let (_tmp, dir) = directory();
    dir.update("ABC/A", "", "192.0.2.1", "", 1);
    dir.update("ABC/B", "", "192.0.2.2", "2001:db8::2", 2);

    let a = dir.find("ABC/A").expect("a");
    let b = dir.find("ABC/B").expect("b");
    assert_eq!(a, b);
    assert_eq!(a.port, 2);
    assert_eq!(a.ip6addr.as_deref(), Some("2001:db8::2"));
}

#[test]
fn update_replaces_instead_of_merging() {
    let (_tmp, dir) = directory();
    dir.update("W1AW/A", "w1aw.example.org", "192.0.2.1", "2001:db8::1", 17000);
    dir.update("W1AW/A", "", "", "", 17001);

    let host = dir.find("W1AW/A").expect("record");
    assert_eq!(host.url, None);
    assert_eq!(host.ip4addr, None);
    assert_eq!(host.ip6addr, None);
    assert_eq!(host.port, 17001);
}

#[test]
fn erase_removes_alias_but_keeps_base_record() {
    let (_tmp, dir) = directory();
    dir.update("K1ABC/A", "", "192.0.2.1", "", 1);
    dir.update("K1ABC/B", "", "192.0.2.1", "", 1);

    assert!(dir.erase("K1ABC/A"));
    assert!(!dir.erase("K1ABC/A"));
    assert!(!dir.keys().contains(&"K1ABC/A".to_string()));
    assert!(dir.find("K1ABC/A").is_none());
    assert!(dir.find_base("K1ABC/A").is_some());
    assert!(dir.find("K1ABC/B").is_some());
    assert_eq!(dir.len(), 1);
}

#[test]
fn snapshot_restore_replaces_contents() {
    let (_tmp, dir) = directory();
    dir.update("M17-XOR A", "xor.example.net", "", "", 17000);
    let snapshot = dir.snapshot();

    dir.update("N0CALL/B", "", "192.0.2.9", "", 9);
    dir.restore(snapshot).expect("restore");

    assert_eq!(dir.keys(), vec!["M17-XOR A".to_string()]);
    assert!(dir.find("N0CALL/B").is_none());
}

#[test]
fn concurrent_writers_and_readers_stay_consistent() {
    let (_tmp, dir) = directory();
    let dir = Arc::new(dir);

    let writers: Vec<_> = (0..4u16)
        .map(|t| {
            let dir = Arc::clone(&dir);
            thread::spawn(move || {
                for i in 0..250u16 {
                    let call = format!("T{t}X{i:03}/A");
                    dir.update(&call, "", "192.0.2.1", "", i);
                    let host = dir.find(&call).expect("own update visible");
                    assert_eq!(host.ip4addr.as_deref(), Some("192.0.2.1"));
                }
            })
        })
        .collect();

    let reader = {
        let dir = Arc::clone(&dir);
        thread::spawn(move || {
            for _ in 0..500 {
                for key in dir.keys() {
                    let _ = dir.find_base(&key);
                }
            }
        })
    };

    for w in writers {
        w.join().expect("writer");
    }
    reader.join().expect("reader");
    assert_eq!(dir.len(), 1000);
}
