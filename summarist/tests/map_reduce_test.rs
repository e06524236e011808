mod support;

use std::sync::Arc;
use std::time::Duration;

use summarist::llm::summarizer::MapReduceSummarizer;
use summarist::{Chunk, SummaryError};
use support::{prompt_content, MockLlm};

fn chunks(n: usize) -> Vec<Chunk> {
    (0..n)
        .map(|i| Chunk {
            text: format!("chunk-{} body", i),
            sequence_index: i,
        })
        .collect()
}

#[tokio::test]
async fn single_chunk_still_gets_a_reduce_pass() {
    let llm = Arc::new(MockLlm::new());
    let summarizer = MapReduceSummarizer::new(llm.clone(), 4);

    let summary = summarizer.summarize(&chunks(1)).await.expect("summary");

    assert_eq!(summary, "FINAL SUMMARY");
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompt_content(&prompts[1]), "partial of <chunk-0 body>");
}

#[tokio::test]
async fn n_chunks_make_n_plus_one_calls_and_reduce_in_order() {
    let llm = Arc::new(MockLlm::new());
    let summarizer = MapReduceSummarizer::new(llm.clone(), 3);

    summarizer.summarize(&chunks(7)).await.expect("summary");

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 8);

    let expected: Vec<String> = (0..7).map(|i| format!("partial of <chunk-{} body>", i)).collect();
    assert_eq!(prompt_content(prompts.last().unwrap()), expected.join("\n\n"));
}

#[tokio::test]
async fn partials_keep_chunk_order_when_calls_finish_out_of_order() {
    // earlier chunks answer slower than later ones
    let llm = Arc::new(MockLlm {
        delay: |content| {
            let index: u64 = content
                .trim_start_matches("chunk-")
                .split(' ')
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            Duration::from_millis(60u64.saturating_sub(index * 15))
        },
        ..MockLlm::new()
    });
    let summarizer = MapReduceSummarizer::new(llm.clone(), 4);

    summarizer.summarize(&chunks(4)).await.expect("summary");

    let prompts = llm.prompts();
    let reduce_input = prompt_content(prompts.last().unwrap());
    assert_eq!(
        reduce_input,
        "partial of <chunk-0 body>\n\npartial of <chunk-1 body>\n\npartial of <chunk-2 body>\n\npartial of <chunk-3 body>"
    );
}

#[tokio::test]
async fn map_failure_fails_the_request_and_skips_reduce() {
    let llm = Arc::new(MockLlm::failing_on("chunk-1 "));
    let summarizer = MapReduceSummarizer::new(llm.clone(), 1);

    let err = summarizer.summarize(&chunks(5)).await.unwrap_err();

    match err {
        SummaryError::Llm(cause) => {
            let message = format!("{:#}", cause);
            assert!(message.contains("map phase, chunk 1"), "{}", message);
            assert!(message.contains("503"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // sequential map: chunk 0 succeeds, chunk 1 fails, nothing after it starts
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn reduce_failure_is_an_llm_error() {
    let llm = Arc::new(MockLlm::failing_on("partial of <"));
    let summarizer = MapReduceSummarizer::new(llm.clone(), 2);

    let err = summarizer.summarize(&chunks(2)).await.unwrap_err();

    assert!(matches!(err, SummaryError::Llm(_)));
    assert_eq!(llm.call_count(), 3);
}

#[tokio::test]
async fn no_chunks_is_rejected_without_calls() {
    let llm = Arc::new(MockLlm::new());
    let summarizer = MapReduceSummarizer::new(llm.clone(), 2);

    let err = summarizer.summarize(&[]).await.unwrap_err();

    assert!(matches!(err, SummaryError::Unknown(_)));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn summary_runs_on_a_spawned_task() {
    let llm = Arc::new(MockLlm::new());
    let summarizer = MapReduceSummarizer::new(llm.clone(), 2);
    let input = chunks(3);

    let summary = tokio::spawn(async move { summarizer.summarize(&input).await })
        .await
        .expect("task joined")
        .expect("summary");

    assert_eq!(summary, "FINAL SUMMARY");
    assert_eq!(llm.call_count(), 4);
}

#[tokio::test]
async fn late_failure_behind_a_slow_chunk_skips_reduce() {
    let llm = Arc::new(MockLlm {
        fail_on: Some("chunk-3 "),
        delay: |content| {
            if content.starts_with("chunk-0 ") {
                Duration::from_millis(80)
            } else {
                Duration::ZERO
            }
        },
        ..MockLlm::new()
    });
    let summarizer = MapReduceSummarizer::new(llm.clone(), 4);

    let err = summarizer.summarize(&chunks(4)).await.unwrap_err();

    assert!(matches!(err, SummaryError::Llm(_)));
    // all four map calls ran, no reduce call followed
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts.iter().all(|p| !prompt_content(p).contains("partial of <")));
}
