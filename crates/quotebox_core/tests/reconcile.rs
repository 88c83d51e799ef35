use quotebox_core::{reconcile, Quote, QuoteSource, ResolutionPolicy};

fn quote(id: i64, text: &str) -> Quote {
    let mut quote = Quote::new(id, text, Some("Author".to_string()), "Life", QuoteSource::Local);
    quote.timestamp = "2024-05-01T10:00:00Z".to_string();
    quote
}

fn remote(id: i64, text: &str) -> Quote {
    Quote {
        source: QuoteSource::Server,
        ..quote(id, text)
    }
}

fn ids(quotes: &[Quote]) -> Vec<i64> {
    quotes.iter().map(|quote| quote.id).collect()
}

#[test]
fn classifies_local_only_remote_only_and_conflicts() {
    let local = vec![quote(1, "one"), quote(2, "two")];
    let remote_quotes = vec![remote(2, "two, edited"), remote(3, "three")];

    let result = reconcile(&local, &remote_quotes);
    assert_eq!(ids(&result.local_only), [1]);
    assert_eq!(ids(&result.new_remote_only), [3]);
    assert_eq!(result.conflict_ids(), [2]);
}

#[test]
fn identical_content_is_not_a_conflict() {
    let local = vec![quote(1, "one"), quote(2, "two")];
    let remote_quotes = vec![remote(2, "two")];

    let result = reconcile(&local, &remote_quotes);
    assert!(result.conflicts.is_empty());
    assert!(result.new_remote_only.is_empty());
    assert_eq!(ids(&result.local_only), [1]);
}

#[test]
fn each_policy_resolves_single_conflict() {
    let local = vec![quote(1, "A")];
    let remote_quotes = vec![remote(1, "B")];
    let result = reconcile(&local, &remote_quotes);

    let server = ResolutionPolicy::ServerWins.apply(&local, &remote_quotes, &result);
    assert_eq!(server.len(), 1);
    assert_eq!(server[0].id, 1);
    assert_eq!(server[0].text, "B");

    let kept = ResolutionPolicy::LocalWins.apply(&local, &remote_quotes, &result);
    assert_eq!(kept, local);

    let merged = ResolutionPolicy::Merge.apply(&local, &remote_quotes, &result);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].text, "B");
    assert_eq!(
        Quote {
            text: "A".to_string(),
            ..merged[0].clone()
        },
        local[0]
    );
}

#[test]
fn policies_keep_local_only_and_add_remote_only() {
    let local = vec![quote(1, "one"), quote(2, "two")];
    let remote_quotes = vec![remote(2, "TWO"), remote(3, "three")];
    let result = reconcile(&local, &remote_quotes);

    for policy in [
        ResolutionPolicy::ServerWins,
        ResolutionPolicy::LocalWins,
        ResolutionPolicy::Merge,
    ] {
        let mut resolved = ids(&policy.apply(&local, &remote_quotes, &result));
        resolved.sort();
        assert_eq!(resolved, [1, 2, 3], "policy {}", policy.as_str());
    }
}

#[test]
fn repeated_remote_ids_resolve_to_last_entry() {
    let local = vec![quote(1, "local")];
    let remote_quotes = vec![remote(1, "first"), remote(1, "second"), remote(4, "x")];
    let result = reconcile(&local, &remote_quotes);

    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].remote.text, "second");

    let server = ResolutionPolicy::ServerWins.apply(&local, &remote_quotes, &result);
    assert_eq!(ids(&server), [1, 4]);
    assert_eq!(server[0].text, "second");
}

#[test]
fn parse_accepts_cli_labels() {
    assert_eq!(
        ResolutionPolicy::parse("Server_Wins").unwrap(),
        ResolutionPolicy::ServerWins
    );
    assert_eq!(
        ResolutionPolicy::parse("local").unwrap(),
        ResolutionPolicy::LocalWins
    );
    assert!(ResolutionPolicy::parse("coin-flip").is_err());
}
