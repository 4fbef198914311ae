//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 片段 -> 注册表 -> 索引 端到端测试
//! - 挂载时机、唯一 sink、无丢失无重复等性质测试

#[cfg(test)]
mod contract_tests {
    use contracts::{Delivery, RegistryError};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_delivery_wire_shape() {
        let buffered = serde_json::to_value(Delivery::Buffered { pending: 3 }).unwrap();
        assert_eq!(buffered, serde_json::json!({"path": "buffered", "pending": 3}));

        let forwarded = serde_json::to_value(Delivery::Forwarded).unwrap();
        assert_eq!(forwarded, serde_json::json!({"path": "forwarded"}));
    }

    #[test]
    fn test_error_messages_name_both_sinks() {
        let err = RegistryError::duplicate_sink_attach("index", "viewer-2");
        let message = err.to_string();
        assert!(message.contains("index"));
        assert!(message.contains("viewer-2"));
        assert!(err.is_programmer_error());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Batch, BatchSink, Delivery, Payload, RegistryError};
    use dispatcher::{create_dispatcher, IndexSink};
    use ingestion::{discover, FragmentLoader};
    use registry::DeferredRegistry;
    use serde_json::json;
    use tempfile::tempdir;

    /// Generated loader script for `std::os::raw::c_int`
    const C_INT_SCRIPT: &str = r#"(function() {
    var type_impls = Object.fromEntries([["nix_bindings_expr_sys",[["<details class=\"toggle implementors-toggle\" open><summary><section id=\"impl-Copy\" class=\"impl\"><h3 class=\"code-header\">impl Copy for c_int</h3></section></summary></details>","Copy","nix_bindings_expr_sys::EvalState"]]],["nix_bindings_util_sys",[]]]);
    if (window.register_type_impls) {
        window.register_type_impls(type_impls);
    } else {
        window.pending_type_impls = type_impls;
    }
})()
//{"start":55,"fragment_lengths":[216,29]}"#;

    fn batch(origin: &str, keys: &[&str]) -> Batch<Payload> {
        keys.iter()
            .map(|k| (*k, json!([])))
            .collect::<Batch<Payload>>()
            .with_origin(origin)
    }

    fn write_fragment_tree(root: &Path) {
        let raw = root.join("std").join("os").join("raw");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join("type.c_int.js"), C_INT_SCRIPT).unwrap();
        fs::write(
            root.join("trait.Send.json"),
            json!([["core", []], ["alloc", [{"text": "impl Send for Arc<T>"}]]]).to_string(),
        )
        .unwrap();
        fs::write(root.join("empty.json"), "[]").unwrap();
    }

    /// Fragment loads before the viewer exists: buffered, then flushed on attach
    #[test]
    fn test_fragment_before_viewer() {
        let dir = tempdir().unwrap();
        write_fragment_tree(dir.path());

        let registry = DeferredRegistry::new();
        let loader = FragmentLoader::default();
        for path in discover(dir.path()).unwrap() {
            let fragment = loader.load_in(dir.path(), &path).unwrap();
            let delivery = registry.submit(fragment.batch).unwrap();
            assert!(!delivery.is_forwarded());
        }
        assert_eq!(registry.pending_len(), 3);

        let dispatcher =
            create_dispatcher("doc-index", &ConfigLoader::default_blueprint().sinks).unwrap();
        let index = dispatcher.index_handles().remove(0).1;
        let report = registry.attach_sink(dispatcher).unwrap();

        assert_eq!(report.flushed, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(registry.pending_len(), 0);
        assert_eq!(
            index.keys(),
            vec!["alloc", "core", "nix_bindings_expr_sys", "nix_bindings_util_sys"]
        );
        // discover() sorts paths, so flush order is path order
        assert_eq!(
            index.origins(),
            vec!["empty", "std/os/raw/type.c_int", "trait.Send"]
        );
    }

    /// Viewer attaches first: every fragment is forwarded straight through
    #[test]
    fn test_viewer_before_fragment() {
        let registry = DeferredRegistry::new();
        let index = IndexSink::new("index");
        let handle = index.handle();

        let report = registry.attach_sink(index).unwrap();
        assert_eq!(report.flushed, 0);

        let fragment = FragmentLoader::default()
            .load_str("type.c_int", C_INT_SCRIPT, ingestion::FragmentFormat::Script)
            .unwrap();
        let delivery = registry.submit(fragment.batch).unwrap();

        assert_eq!(delivery, Delivery::Forwarded);
        assert!(handle.contains_key("nix_bindings_expr_sys"));
        assert_eq!(handle.get("nix_bindings_util_sys"), Some(json!([])));
        assert_eq!(registry.stats().buffered, 0);
    }

    /// Final index and delivery order do not depend on when the sink attaches
    #[test]
    fn test_order_independence_of_attach() {
        let batches = [
            batch("a", &["x", "y"]),
            batch("b", &["y", "z"]),
            batch("c", &[]),
            batch("d", &["w"]),
        ];

        let mut results = Vec::new();
        for attach_at in 0..=batches.len() {
            let registry = DeferredRegistry::new();
            let index = IndexSink::new("index");
            let handle = index.handle();
            let mut index = Some(index);

            for (i, b) in batches.iter().enumerate() {
                if i == attach_at {
                    if let Some(sink) = index.take() {
                        registry.attach_sink(sink).unwrap();
                    }
                }
                registry.submit(b.clone()).unwrap();
            }
            if let Some(sink) = index.take() {
                registry.attach_sink(sink).unwrap();
            }

            assert_eq!(handle.origins(), vec!["a", "b", "c", "d"], "attach at {attach_at}");
            results.push(handle.snapshot());
        }

        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    /// At most one sink: the second attach fails and changes nothing
    #[test]
    fn test_second_attach_rejected() {
        let registry = DeferredRegistry::new();
        let first = IndexSink::new("first");
        let second = IndexSink::new("second");
        let (first_handle, second_handle) = (first.handle(), second.handle());

        registry.submit(batch("early", &["a"])).unwrap();
        registry.attach_sink(first).unwrap();

        let err = registry.attach_sink(second).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::DuplicateSinkAttach { ref attached, ref rejected }
                if attached == "first" && rejected == "second"
        ));

        registry.submit(batch("late", &["b"])).unwrap();
        assert_eq!(first_handle.keys(), vec!["a", "b"]);
        assert!(second_handle.is_empty());
        assert_eq!(registry.sink_name().as_deref(), Some("first"));
        assert_eq!(registry.stats().rejected_attaches, 1);
    }

    /// Empty batches are legal on both paths and reach the sink
    #[test]
    fn test_empty_batch_accepted() {
        let registry: DeferredRegistry<Payload> = DeferredRegistry::new();
        let index = IndexSink::new("index");
        let handle = index.handle();

        assert!(registry.submit(Batch::new()).is_ok());
        registry.attach_sink(index).unwrap();
        assert!(registry.submit(Batch::new()).is_ok());

        assert!(handle.is_empty());
        assert_eq!(handle.batches(), 2);
    }

    /// Concurrent producers racing the attach: every batch arrives exactly once
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_loss_no_duplication_under_concurrency() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 100;

        let registry = Arc::new(DeferredRegistry::new());
        let index = IndexSink::new("index");
        let handle = index.handle();

        let mut tasks = Vec::new();
        for p in 0..PRODUCERS {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::task::spawn_blocking(move || {
                for i in 0..PER_PRODUCER {
                    let key = format!("p{p}_k{i}");
                    registry
                        .submit(batch(&format!("p{p}_{i}"), &[key.as_str()]))
                        .unwrap();
                }
            }));
        }

        let attacher = {
            let registry = Arc::clone(&registry);
            tokio::task::spawn_blocking(move || registry.attach_sink(index).unwrap())
        };

        for task in tasks {
            task.await.unwrap();
        }
        let report = attacher.await.unwrap();

        let total = PRODUCERS * PER_PRODUCER;
        let stats = registry.stats();
        assert_eq!(handle.batches(), total);
        assert_eq!(handle.len(), total);
        assert_eq!(handle.overwritten(), 0);
        assert_eq!(report.flushed as u64 + stats.forwarded, total as u64);
        assert_eq!(stats.outstanding(), 0);

        // per-producer submission order survives the merge
        let origins = handle.origins();
        for p in 0..PRODUCERS {
            let prefix = format!("p{p}_");
            let seen: Vec<usize> = origins
                .iter()
                .filter_map(|o| o.strip_prefix(&prefix))
                .map(|i| i.parse().unwrap())
                .collect();
            assert_eq!(seen, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }

    /// Config-driven sinks: index plus JSON Lines file, fed across the attach
    #[test]
    fn test_configured_sinks_receive_every_batch() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out").join("type_impls.jsonl");
        let config = format!(
            r#"
[registry]
duplicate_keys = "reject"

[[sinks]]
name = "index"
sink_type = "index"

[[sinks]]
name = "jsonl"
sink_type = "file"
[sinks.params]
path = "{}"
"#,
            out.display().to_string().replace('\\', "/")
        );
        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();

        let registry = DeferredRegistry::new();
        registry.submit(batch("one", &["a"])).unwrap();

        let dispatcher = create_dispatcher("doc-index", &blueprint.sinks).unwrap();
        let index = dispatcher.index_handles().remove(0).1;
        registry.attach_sink(dispatcher).unwrap();
        registry.submit(batch("two", &["b", "c"])).unwrap();
        registry.flush_sink().unwrap();

        assert_eq!(index.len(), 3);
        let lines: Vec<serde_json::Value> = fs::read_to_string(&out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["origin"], "one");
        assert_eq!(lines[1]["origin"], "two");
    }

    /// A strict loader refuses the fragment before it reaches the registry
    #[test]
    fn test_malformed_fragment_never_registered() {
        let registry: DeferredRegistry<Payload> = DeferredRegistry::new();
        let loader = FragmentLoader::new(contracts::DuplicateKeyPolicy::Reject);

        let err = loader
            .load_str("dup", r#"[["a",[]],["a",[1]]]"#, ingestion::FragmentFormat::Json)
            .unwrap_err();
        assert!(matches!(
            RegistryError::from(err),
            RegistryError::MalformedBatch { .. }
        ));
        assert_eq!(registry.pending_len(), 0);
        assert_eq!(registry.stats().submitted, 0);
    }

    /// The process-wide registry behaves like a local one
    #[test]
    fn test_global_registry_round_trip() {
        let index = IndexSink::new("global-index");
        let handle = index.handle();

        registry::global::submit(batch("global-early", &["g1"])).unwrap();
        let report = registry::global::attach_sink(index).unwrap();
        registry::global::submit(batch("global-late", &["g2"])).unwrap();

        assert!(report.flushed >= 1);
        assert!(registry::global::is_attached());
        assert_eq!(registry::global::pending_len(), 0);
        assert!(handle.contains_key("g1"));
        assert!(handle.contains_key("g2"));

        let again = registry::global::attach_sink(IndexSink::<Payload>::new("other"));
        assert!(again.is_err());
    }

    #[test]
    fn test_sink_trait_object_usable() {
        let mut sink: Box<dyn BatchSink<Payload>> = Box::new(IndexSink::new("boxed"));
        assert_eq!(sink.name(), "boxed");
        assert!(sink.accept(Batch::new()).is_ok());
    }
}
