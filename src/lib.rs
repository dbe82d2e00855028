//! # danci-learn - 学习模式轮次调度
//!
//! 本 crate 实现学习模式 (Learn mode) 的核心状态机:
//!
//! - **Term Registry** - 词条与干扰项的只读索引
//! - **Correctness Tracker** - 词条掌握状态 (未学 / 熟悉 / 掌握 / 答错)
//! - **Choice Builder** - 选择题干扰项挑选与洗牌
//! - **Round Scheduler** - 每轮词条选择 (答错优先、熟悉词条冷却两轮)
//! - **Session State Machine** - 题目推进、轮次总结与完成判定
//!
//! 所有状态转换都是纯函数: 输入旧快照，返回新快照，不做任何 I/O。
//!
//! ## 使用示例
//!
//! ```rust
//! use danci_learn::{LearnConfig, LearnSession, TermInput};
//!
//! let terms = vec![
//!     TermInput::new("1", "chat", "cat"),
//!     TermInput::new("2", "chien", "dog"),
//! ];
//! let mut session = LearnSession::new(terms, LearnConfig::default()).unwrap();
//!
//! let pending = session.answer_correctly(0).unwrap();
//! // 正确反馈展示 pending.delay 之后:
//! assert!(session.complete_pending(pending));
//! assert_eq!(session.state().round_counter(), 1);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod choices;
pub mod config;
pub mod deferred;
pub mod error;
pub mod feedback;
pub mod logging;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod tracker;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

pub use types::*;

pub use config::LearnConfig;
pub use deferred::{spawn_deferred_completion, CompletionHandle, PendingCompletion, SharedSession};
pub use error::LearnError;
pub use feedback::FeedbackBank;
pub use registry::{DistractorInput, Term, TermInput, TermRegistry};
pub use scheduler::RoundPlan;
pub use session::LearnSession;
pub use state::SessionState;
pub use tracker::TermProgress;
