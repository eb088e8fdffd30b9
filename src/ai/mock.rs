use super::GenerationService;
use crate::models::{EncodedImage, TransformationRequest, TransformationResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A 1x1 PNG, base64 encoded.
const TINY_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVQImWP4z8AAAAMBAQDiJQC8AAAAAElFTkSuQmCC";

/// Scripted [`GenerationService`] for tests and offline harnesses.
///
/// Responses are replayed in order and cycle once exhausted. With no scripted
/// responses every call succeeds with a tiny PNG. Delays are scripted and
/// cycled the same way.
pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<TransformationResult>>>,
    requests: Arc<Mutex<Vec<TransformationRequest>>>,
    call_count: Arc<Mutex<usize>>,
    delays: Arc<Mutex<Vec<Duration>>>,
    panic_message: Option<String>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            delays: Arc::new(Mutex::new(Vec::new())),
            panic_message: None,
        }
    }

    pub fn with_response(self, response: TransformationResult) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_image_response(self, image: EncodedImage) -> Self {
        self.with_response(TransformationResult::Success { image })
    }

    pub fn with_failure_response(self, reason: &str) -> Self {
        self.with_response(TransformationResult::Failure {
            reason: reason.to_string(),
        })
    }

    /// Sleep before answering, to simulate service latency.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.delays.lock().unwrap().push(delay);
        self
    }

    /// Panic inside `generate`, to exercise boundary normalization.
    pub fn with_panic(mut self, message: &str) -> Self {
        self.panic_message = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<TransformationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn default_image() -> EncodedImage {
        EncodedImage::new("image/png", TINY_PNG_BASE64).unwrap()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(&self, request: &TransformationRequest) -> TransformationResult {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.requests.lock().unwrap().push(request.clone());

        let delay = {
            let delays = self.delays.lock().unwrap();
            (!delays.is_empty()).then(|| delays[(count - 1) % delays.len()])
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.panic_message {
            panic!("{}", message);
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            TransformationResult::Success {
                image: Self::default_image(),
            }
        } else {
            let index = (count - 1) % responses.len();
            responses[index].clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TransformationRequest {
        TransformationRequest::new(MockGenerationClient::default_image(), "cartoonify")
    }

    #[tokio::test]
    async fn test_mock_default_succeeds() {
        let client = MockGenerationClient::new();
        let result = client.generate(&request()).await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_mock_custom_responses_cycle() {
        let client = MockGenerationClient::new()
            .with_failure_response("first")
            .with_failure_response("second");

        let reasons: Vec<TransformationResult> = vec![
            client.generate(&request()).await,
            client.generate(&request()).await,
            client.generate(&request()).await,
        ];

        assert_eq!(
            reasons,
            vec![
                TransformationResult::Failure {
                    reason: "first".to_string()
                },
                TransformationResult::Failure {
                    reason: "second".to_string()
                },
                TransformationResult::Failure {
                    reason: "first".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_delay_holds_the_answer() {
        let client = MockGenerationClient::new().with_delay(Duration::from_millis(50));

        let started = std::time::Instant::now();
        assert!(client.generate(&request()).await.is_success());
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let client = MockGenerationClient::new();

        assert_eq!(client.get_call_count(), 0);
        client.generate(&request()).await;
        assert_eq!(client.get_call_count(), 1);
        assert_eq!(client.get_requests()[0].instruction(), "cartoonify");
    }
}
