//! Static improvement tips shown in the exported report.

use crate::model::RoundId;

/// General advice for a round, independent of the candidate's stack.
#[must_use]
pub fn base_tips(round: &RoundId) -> &'static [&'static str] {
    match round.as_str() {
        "recruiter" => &[
            "Tell coherent stories using STAR",
            "Map experience to the JD",
            "Emphasize motivation and culture fit",
        ],
        "technical" => &[
            "Structure answers: Problem, Approach, Tradeoffs",
            "Provide concise code snippets",
            "State complexity and optimizations",
        ],
        "ds_algo" => &[
            "Analyze complexity before coding",
            "Design edge-case tests",
            "Justify chosen data structures",
        ],
        "system_design" => &[
            "Start from requirements",
            "Draw high-level architecture (API, storage, cache, queue)",
            "Discuss bottlenecks and scaling plan",
        ],
        "leadership" => &[
            "Use real scenarios",
            "Clarify role, decisions, outcomes",
            "Reflect and extract lessons",
        ],
        _ => &[],
    }
}

/// Stack-specific advice; only the technical rounds have any.
#[must_use]
pub fn stack_tips(stack: &str, round: &RoundId) -> &'static [&'static str] {
    match (stack, round.as_str()) {
        ("Golang", "technical") => &[
            "Use goroutines/channels for concurrency",
            "Explain defer/panic/recover",
            "Understand interfaces and struct embedding",
        ],
        ("Golang", "ds_algo") => &[
            "Optimize slice operations",
            "Use sync package for synchronization",
            "Avoid memory leaks with goroutines",
        ],
        ("Golang", "system_design") => &[
            "Design microservices with Go kit or Gin",
            "Handle concurrent requests efficiently",
            "Go routines pooling",
        ],
        ("Python", "technical") => &[
            "Explain GIL and concurrency impact",
            "Use decorators for code optimization",
            "Memory management with garbage collection",
        ],
        ("Python", "ds_algo") => &[
            "Use list comprehensions for performance",
            "Optimize dictionary lookups",
            "Use generators for large datasets",
        ],
        ("Python", "system_design") => &[
            "Use Celery for async tasks",
            "Django/FastAPI scalability",
            "Python multiprocessing vs multithreading",
        ],
        ("NodeJS", "technical") => &[
            "Understand Event Loop and non-blocking I/O",
            "Use Streams for large data",
            "Manage memory leaks in Node.js",
        ],
        ("NodeJS", "ds_algo") => &[
            "Optimize V8 engine execution",
            "Use Buffer efficiently",
            "Async/Await vs Promises patterns",
        ],
        ("NodeJS", "system_design") => &[
            "Design scalable architecture with Clustering",
            "Microservices with NestJS/Express",
            "Use Redis for caching/pub-sub",
        ],
        ("NestJS", "technical") => &[
            "Dependency Injection in NestJS",
            "Use Interceptors, Guards, Pipes",
            "Module architecture patterns",
        ],
        ("NestJS", "ds_algo") => &[
            "Optimize TypeORM/Prisma queries",
            "Reactive programming with RxJS",
            "Custom decorators implementation",
        ],
        ("NestJS", "system_design") => &[
            "Microservices with NestJS Transport layers",
            "CQRS pattern implementation",
            "WebSocket gateways scaling",
        ],
        _ => &[],
    }
}

/// Base tips followed by the tips for each selected stack.
#[must_use]
pub fn improvement_tips(round: &RoundId, stacks: &[String]) -> Vec<&'static str> {
    let mut tips = base_tips(round).to_vec();
    for stack in stacks {
        tips.extend_from_slice(stack_tips(stack, round));
    }
    tips
}
