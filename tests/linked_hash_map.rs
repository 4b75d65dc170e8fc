// LinkedHashMap integration suite.
//
// Order is the point of this engine, so most checks compare the full
// forward (and sometimes reverse) key sequence.
use scalar_maps::{LinkedHashMap, MapCore, MapError};

fn keys<V>(m: &LinkedHashMap<char, V>) -> Vec<char> {
    m.keys().copied().collect()
}

// Test: move an entry to the front, then poll the back.
// Verifies: [A, B, C] -> move C first -> [C, A, B] -> poll last gives B.
#[test]
fn example_scenario_move_and_poll() {
    let mut m = LinkedHashMap::new();
    m.put('A', 1);
    m.put('B', 2);
    m.put('C', 3);
    assert!(m.move_to_first(&'C'));
    assert_eq!(keys(&m), ['C', 'A', 'B']);
    assert_eq!(m.poll_last_key(), Some('B'));
    assert_eq!(keys(&m), ['C', 'A']);
    assert_eq!(m.len(), 2);
}

// Test: overwriting keeps position; removal closes the gap.
#[test]
fn insertion_order_survives_overwrite_and_remove() {
    let mut m: LinkedHashMap<char, u32> = LinkedHashMap::new();
    for (i, c) in "abcde".chars().enumerate() {
        m.put(c, i as u32);
    }
    assert_eq!(m.put('b', 20), 1);
    assert_eq!(keys(&m), ['a', 'b', 'c', 'd', 'e']);
    assert_eq!(m.remove(&'c'), 2);
    assert_eq!(keys(&m), ['a', 'b', 'd', 'e']);
    let reversed: Vec<char> = m.keys().rev().copied().collect();
    assert_eq!(reversed, ['e', 'd', 'b', 'a']);
    assert_eq!(m.iter().len(), 4);
}

#[test]
fn put_and_move_variants() {
    let mut m: LinkedHashMap<char, i32> = LinkedHashMap::new().with_default_return_value(-1);
    assert_eq!(m.put_and_move_to_last('x', 1), -1);
    assert_eq!(m.put_and_move_to_first('y', 2), -1);
    assert_eq!(keys(&m), ['y', 'x']);
    assert_eq!(m.put_and_move_to_first('x', 10), 1);
    assert_eq!(keys(&m), ['x', 'y']);
    assert_eq!(m.get_and_move_to_last(&'x'), 10);
    assert_eq!(keys(&m), ['y', 'x']);
    assert_eq!(m.get_and_move_to_first(&'z'), -1);
    assert!(!m.move_to_last(&'z'));
    assert_eq!(keys(&m), ['y', 'x']);
}

#[test]
fn first_last_and_pops() {
    let mut m: LinkedHashMap<u8, u8> = (1..=5).map(|k| (k, k * 10)).collect();
    assert_eq!(m.first(), Some((&1, &10)));
    assert_eq!(m.last_key(), Some(&5));
    assert_eq!(m.first_value(), Some(&10));
    assert_eq!(m.last_value(), Some(&50));
    assert_eq!(m.pop_first(), Some((1, 10)));
    assert_eq!(m.pop_last(), Some((5, 50)));
    assert_eq!(m.poll_first_key(), Some(2));
    assert_eq!(m.len(), 2);
    m.clear();
    assert_eq!(m.pop_first(), None);
    assert_eq!(m.poll_last_key(), None);
    assert_eq!(m.first(), None);
}

// Test: iteration starting after a given key.
#[test]
fn iter_after_key() {
    let m: LinkedHashMap<u8, u8> = (1..=5).map(|k| (k, k)).collect();
    let tail: Vec<u8> = m.iter_after(&2).unwrap().map(|(k, _)| *k).collect();
    assert_eq!(tail, [3, 4, 5]);
    assert_eq!(m.iter_after(&5).unwrap().count(), 0);
    assert!(m.iter_after(&9).is_none());
    let back: Vec<u8> = m.iter_after(&3).unwrap().rev().map(|(k, _)| *k).collect();
    assert_eq!(back, [5, 4]);
}

// Test: order is kept across growth and shrinking of the slot array.
#[test]
fn order_survives_rehash() {
    let mut m: LinkedHashMap<u32, u32> = LinkedHashMap::with_capacity(4).unwrap();
    let expected: Vec<u32> = (0..2_000).rev().collect();
    for &k in &expected {
        m.put(k, k);
    }
    assert!(m.capacity() >= 2_000);
    assert!(m.keys().copied().eq(expected.iter().copied()));
    for k in 100..2_000 {
        m.remove(&k);
    }
    m.shrink_to_fit();
    assert!(m.keys().copied().eq((0..100).rev()));
}

#[test]
fn cursor_removes_in_order() {
    let mut m: LinkedHashMap<u32, u32> = (0..10).map(|k| (k, k)).collect();
    let mut cur = m.cursor();
    let mut seen = Vec::new();
    while let Some((&k, _)) = cur.next(&m).unwrap() {
        seen.push(k);
        if k % 3 == 0 {
            assert_eq!(cur.remove(&mut m), Ok((k, k)));
        }
    }
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
    assert!(m.keys().copied().eq([1, 2, 4, 5, 7, 8]));
    assert_eq!(cur.remove(&mut m), Err(MapError::NoCurrentEntry));
}

// Test: reordering from outside invalidates a live cursor.
#[test]
fn cursor_fails_after_reorder() {
    let mut m: LinkedHashMap<u32, u32> = (0..4).map(|k| (k, k)).collect();
    let mut cur = m.cursor();
    cur.next(&m).unwrap();
    m.move_to_last(&0);
    assert_eq!(cur.next(&m), Err(MapError::ConcurrentModification));
    assert_eq!(cur.next(&m), Err(MapError::ConcurrentModification));
}

#[test]
fn equality_is_order_sensitive() {
    let a: LinkedHashMap<u8, u8> = [(1, 1), (2, 2)].into_iter().collect();
    let b: LinkedHashMap<u8, u8> = [(2, 2), (1, 1)].into_iter().collect();
    assert_ne!(a, b);
    let mut c = b.clone();
    c.move_to_last(&2);
    assert_eq!(a, c);
    assert_eq!(format!("{a:?}"), "{1: 1, 2: 2}");
}
