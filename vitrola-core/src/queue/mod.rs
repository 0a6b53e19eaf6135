mod request;

use std::{
    cmp::Reverse,
    collections::{HashMap, VecDeque},
};

use chrono::{DateTime, Utc};

pub use request::*;

/// Keeps every known request, and the order in which queued requests will play.
#[derive(Debug, Default)]
pub struct QueueStore {
    requests: HashMap<RequestId, Request>,
    /// Queued requests, the first one plays next
    items: VecDeque<RequestId>,
    /// Finished requests, oldest first
    history: VecDeque<RequestId>,
}

impl QueueStore {
    pub fn insert(&mut self, request: Request) -> RequestId {
        let id = request.id;
        self.requests.insert(id, request);

        id
    }

    pub fn get(&self, id: RequestId) -> Option<&Request> {
        self.requests.get(&id)
    }

    pub fn get_mut(&mut self, id: RequestId) -> Result<&mut Request, RequestError> {
        self.requests.get_mut(&id).ok_or(RequestError::NotFound(id))
    }

    /// Marks a pending request as queued and places it in the queue.
    /// Priority requests go behind other priority requests, but ahead of everything else.
    ///
    /// Returns the position the request ended up at.
    pub fn enqueue(&mut self, id: RequestId) -> Result<usize, RequestError> {
        let request = self.requests.get_mut(&id).ok_or(RequestError::NotFound(id))?;
        request.transition(QueueStatus::Queued)?;
        let priority = request.priority;

        let position = if priority {
            self.items
                .iter()
                .position(|i| !self.requests.get(i).is_some_and(|r| r.priority))
                .unwrap_or(self.items.len())
        } else {
            self.items.len()
        };

        self.items.insert(position, id);
        Ok(position)
    }

    /// Takes the head of the queue and marks it as playing.
    pub fn start_next(&mut self) -> Option<RequestId> {
        let id = self.items.pop_front()?;

        let request = self.requests.get_mut(&id)?;
        request.transition(QueueStatus::Playing).ok()?;

        Some(id)
    }

    /// Marks a playing request as played.
    pub fn finish(&mut self, id: RequestId, reason: EndReason) -> Result<(), RequestError> {
        let request = self.get_mut(id)?;

        request.transition(QueueStatus::Played)?;
        request.ended_by = Some(reason);

        self.history.push_back(id);
        Ok(())
    }

    /// Cancels a pending or queued request, removing it from the queue.
    ///
    /// Returns true if the queue changed.
    pub fn cancel(&mut self, id: RequestId) -> Result<bool, RequestError> {
        let request = self.get_mut(id)?;
        let was_queued = request.status == QueueStatus::Queued;

        request.transition(QueueStatus::Cancelled)?;

        self.items.retain(|i| *i != id);
        self.history.push_back(id);

        Ok(was_queued)
    }

    /// Returns the queued requests, in the order they will play
    pub fn queued(&self) -> Vec<Request> {
        self.items
            .iter()
            .filter_map(|id| self.requests.get(id))
            .cloned()
            .collect()
    }

    pub fn position(&self, id: RequestId) -> Option<usize> {
        self.items.iter().position(|i| *i == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Counts the known requests with the given status
    pub fn count(&self, status: QueueStatus) -> usize {
        self.requests.values().filter(|r| r.status == status).count()
    }

    /// Returns true if a queued or playing request references the given video
    pub fn is_in_rotation(&self, video_id: &str) -> bool {
        self.requests.values().any(|r| {
            matches!(r.status, QueueStatus::Queued | QueueStatus::Playing)
                && r.track.video_id == video_id
        })
    }

    /// Cancels pending requests created before `created_before`,
    /// along with the oldest ones beyond `keep`.
    ///
    /// Returns the cancelled requests.
    pub fn expire_pending(
        &mut self,
        created_before: DateTime<Utc>,
        keep: usize,
    ) -> Vec<RequestId> {
        let mut pending: Vec<_> = self
            .requests
            .values()
            .filter(|r| r.status == QueueStatus::Pending)
            .map(|r| (r.id, r.created_at))
            .collect();

        // Newest first, ids only grow
        pending.sort_by_key(|(id, _)| Reverse(id.value()));

        pending
            .into_iter()
            .enumerate()
            .filter(|(index, (_, created_at))| *index >= keep || *created_at < created_before)
            .filter_map(|(_, (id, _))| self.cancel(id).ok().map(|_| id))
            .collect()
    }

    /// Forgets the oldest finished requests beyond `keep`.
    /// Returns how many were removed.
    pub fn prune(&mut self, keep: usize) -> usize {
        let excess = self.history.len().saturating_sub(keep);

        for id in self.history.drain(..excess) {
            self.requests.remove(&id);
        }

        excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(store: &QueueStore) -> Vec<String> {
        store
            .queued()
            .into_iter()
            .map(|r| r.track.video_id)
            .collect()
    }

    fn add(store: &mut QueueStore, video_id: &str, priority: bool) -> RequestId {
        let id = store.insert(Request::new(NewRequest {
            priority,
            ..NewRequest::mock(video_id)
        }));

        store.enqueue(id).unwrap();
        id
    }

    #[test]
    fn priority_items_go_ahead_of_regular_ones() {
        let mut store = QueueStore::default();

        add(&mut store, "strawberries", false);
        add(&mut store, "bananas", false);
        add(&mut store, "apples", true);
        add(&mut store, "windows", true);
        add(&mut store, "linux", false);

        assert_eq!(
            titles(&store),
            vec!["apples", "windows", "strawberries", "bananas", "linux"]
        );
    }

    #[test]
    fn start_next_moves_the_head_to_playing() {
        let mut store = QueueStore::default();

        let first = add(&mut store, "a", false);
        add(&mut store, "b", false);

        assert_eq!(store.start_next(), Some(first));
        assert_eq!(store.get(first).unwrap().status, QueueStatus::Playing);
        assert_eq!(titles(&store), vec!["b"]);

        assert!(store.is_in_rotation("a"), "playing items are in rotation");
        assert!(store.is_in_rotation("b"));

        store.finish(first, EndReason::Completed).unwrap();
        assert!(!store.is_in_rotation("a"));
    }

    #[test]
    fn cancelling_removes_from_the_queue() {
        let mut store = QueueStore::default();

        let id = add(&mut store, "a", false);
        let pending = store.insert(Request::new(NewRequest::mock("b")));

        assert!(store.cancel(id).unwrap(), "queued request changes the queue");
        assert!(!store.cancel(pending).unwrap());
        assert!(store.is_empty());

        assert!(store.cancel(id).is_err(), "cannot cancel twice");
    }

    #[test]
    fn stale_and_excess_pending_requests_expire() {
        let mut store = QueueStore::default();
        let now = Utc::now();

        let old = store.insert(Request::new(NewRequest::mock("old")));
        store.get_mut(old).unwrap().created_at = now - chrono::TimeDelta::hours(2);

        let first = store.insert(Request::new(NewRequest::mock("first")));
        let second = store.insert(Request::new(NewRequest::mock("second")));
        let third = store.insert(Request::new(NewRequest::mock("third")));
        let queued = add(&mut store, "queued", false);

        let cutoff = now - chrono::TimeDelta::hours(1);
        let mut expired = store.expire_pending(cutoff, 2);
        expired.sort_by_key(|id| id.value());

        assert_eq!(expired, vec![old, first]);
        assert_eq!(store.get(old).unwrap().status, QueueStatus::Cancelled);
        assert_eq!(store.get(second).unwrap().status, QueueStatus::Pending);
        assert_eq!(store.get(third).unwrap().status, QueueStatus::Pending);
        assert_eq!(store.get(queued).unwrap().status, QueueStatus::Queued);

        // Expired requests are finished, so pruning forgets them
        assert_eq!(store.prune(0), 2);
        assert!(store.get(old).is_none());
    }

    #[test]
    fn prune_forgets_only_finished_requests() {
        let mut store = QueueStore::default();

        let first = add(&mut store, "a", false);
        let second = add(&mut store, "b", false);
        let waiting = add(&mut store, "c", false);

        store.start_next();
        store.finish(first, EndReason::Completed).unwrap();
        store.start_next();
        store.finish(second, EndReason::Skipped).unwrap();

        assert_eq!(store.prune(1), 1);
        assert!(store.get(first).is_none());
        assert!(store.get(second).is_some());
        assert!(store.get(waiting).is_some());
    }
}
