use std::collections::HashSet;
use std::sync::Arc;

use mediadrop_sessions::{FetchSession, SessionStore};
use mediadrop_test_support::fixtures::scratch_root;

#[test]
fn concurrent_allocations_are_distinct() -> anyhow::Result<()> {
    let root = scratch_root()?;
    let store = Arc::new(SessionStore::open(root.path().join("downloads"))?);

    let sessions: Vec<FetchSession> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                scope.spawn(move || (0..8).map(|_| store.create()).collect::<Vec<_>>())
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_default())
            .collect::<Result<Vec<_>, _>>()
    })?;

    assert_eq!(sessions.len(), 128);
    let ids: HashSet<_> = sessions.iter().map(FetchSession::id).collect();
    let dirs: HashSet<_> = sessions.iter().map(|s| s.dir().to_path_buf()).collect();
    assert_eq!(ids.len(), sessions.len());
    assert_eq!(dirs.len(), sessions.len());
    assert_eq!(std::fs::read_dir(store.root())?.count(), sessions.len());
    Ok(())
}
