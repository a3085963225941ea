//! Problem and quiz generation.
//!
//! The trait is the seam for an external generation service; the
//! in-crate [`StaticPool`] is the fallback catalog the engine uses
//! whenever the store has nothing for a mode. Its problems mirror the
//! classic seed set (Two Sum and friends) so every mode always has a
//! playable race.

use std::collections::HashMap;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use uuid::Uuid;

use colosseum_common::{
    AppResult, ArenaError, Difficulty, GameMode, Language, Problem, QuizQuestion, TestCase,
};

/// Source of fresh problems and quiz questions
#[async_trait]
pub trait ProblemGenerator: Send + Sync {
    /// Produce a problem for the mode's pool at the given difficulty
    async fn generate_problem(&self, mode: GameMode, difficulty: Difficulty) -> AppResult<Problem>;
    /// Produce quiz questions targeting the given language
    async fn generate_quiz_questions(
        &self,
        language: Language,
        count: usize,
    ) -> AppResult<Vec<QuizQuestion>>;
}

/// Built-in catalog used when no external generator is wired in
pub struct StaticPool {
    problems: Vec<Problem>,
    questions: Vec<QuizQuestion>,
}

impl Default for StaticPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticPool {
    pub fn new() -> Self {
        Self {
            problems: builtin_problems(),
            questions: builtin_questions(),
        }
    }

    /// The full catalog, for seeding a problem store up front
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Insert every catalog problem into the store
    pub async fn seed(&self, store: &dyn crate::store::ProblemStore) -> AppResult<()> {
        for problem in &self.problems {
            store.insert(problem.clone()).await?;
        }
        tracing::info!(count = self.problems.len(), "Seeded static problem catalog");
        Ok(())
    }
}

#[async_trait]
impl ProblemGenerator for StaticPool {
    async fn generate_problem(&self, mode: GameMode, difficulty: Difficulty) -> AppResult<Problem> {
        let pool_mode = mode.problem_pool();
        let candidates: Vec<&Problem> = self
            .problems
            .iter()
            .filter(|p| p.mode == pool_mode && p.difficulty == difficulty)
            .collect();
        // Relax the difficulty before giving up
        let candidates = if candidates.is_empty() {
            self.problems.iter().filter(|p| p.mode == pool_mode).collect()
        } else {
            candidates
        };
        let picked = candidates.choose(&mut rand::rng()).ok_or_else(|| {
            ArenaError::GeneratorUnavailable(format!("No problems available for {pool_mode}"))
        })?;
        let mut problem = (*picked).clone();
        problem.id = Uuid::new_v4();
        Ok(problem)
    }

    // The built-in bank is Python-only; the language matters for
    // external generators behind the same trait.
    async fn generate_quiz_questions(
        &self,
        _language: Language,
        count: usize,
    ) -> AppResult<Vec<QuizQuestion>> {
        if self.questions.is_empty() {
            return Err(ArenaError::GeneratorUnavailable(
                "Quiz question bank is empty".into(),
            ));
        }
        let mut rng = rand::rng();
        let mut picked = Vec::with_capacity(count);
        for _ in 0..count {
            if let Some(q) = self.questions.choose(&mut rng) {
                picked.push(q.clone());
            }
        }
        Ok(picked)
    }
}

fn problem(
    title: &str,
    difficulty: Difficulty,
    description: &str,
    mode: GameMode,
    cases: &[(&str, &str)],
    reference_py: &str,
    buggy_py: Option<&str>,
    hint: &str,
) -> Problem {
    let mut reference_code = HashMap::new();
    reference_code.insert(Language::Python, reference_py.to_string());
    let mut buggy_code = HashMap::new();
    if let Some(buggy) = buggy_py {
        buggy_code.insert(Language::Python, buggy.to_string());
    }
    Problem {
        id: Uuid::new_v4(),
        title: title.to_string(),
        difficulty,
        description: description.to_string(),
        test_cases: cases
            .iter()
            .map(|(input, expected)| TestCase {
                input: (*input).to_string(),
                expected: (*expected).to_string(),
            })
            .collect(),
        reference_code,
        buggy_code,
        starter_code: HashMap::new(),
        hint: hint.to_string(),
        mode,
        quiz_questions: Vec::new(),
    }
}

fn builtin_problems() -> Vec<Problem> {
    let mut problems = vec![
        problem(
            "Two Sum",
            Difficulty::Easy,
            "Given an array of integers `nums` and an integer `target`, return indices of the two numbers that add up to `target`.",
            GameMode::Standard,
            &[
                ("[2,7,11,15]\n9", "[0, 1]"),
                ("[3,2,4]\n6", "[1, 2]"),
                ("[3,3]\n6", "[0, 1]"),
                ("[1,5,3,7,9]\n10", "[2, 3]"),
            ],
            "def two_sum(nums, target):\n    seen = {}\n    for i, num in enumerate(nums):\n        complement = target - num\n        if complement in seen:\n            return [seen[complement], i]\n        seen[num] = i\n    return []",
            None,
            "Use a hash map to store numbers you've seen and their indices.",
        ),
        problem(
            "Palindrome Number",
            Difficulty::Easy,
            "Given an integer `x`, return `true` if `x` is a palindrome, and `false` otherwise.",
            GameMode::Standard,
            &[
                ("121", "true"),
                ("-121", "false"),
                ("10", "false"),
                ("0", "true"),
                ("12321", "true"),
            ],
            "def is_palindrome(x):\n    if x < 0:\n        return False\n    return str(x) == str(x)[::-1]",
            None,
            "Convert to string and compare with its reverse.",
        ),
        problem(
            "Longest Substring Without Repeating Characters",
            Difficulty::Medium,
            "Given a string `s`, find the length of the longest substring without repeating characters.",
            GameMode::Standard,
            &[
                ("abcabcbb", "3"),
                ("bbbbb", "1"),
                ("pwwkew", "3"),
                ("dvdf", "3"),
            ],
            "def length_of_longest_substring(s):\n    char_set = set()\n    left = 0\n    max_length = 0\n    for right in range(len(s)):\n        while s[right] in char_set:\n            char_set.remove(s[left])\n            left += 1\n        char_set.add(s[right])\n        max_length = max(max_length, right - left + 1)\n    return max_length",
            None,
            "Use a sliding window with a set of characters in the current window.",
        ),
        problem(
            "Container With Most Water",
            Difficulty::Medium,
            "Given an integer array `height`, find two lines that together with the x-axis form a container holding the most water. Return the maximum area.",
            GameMode::Standard,
            &[
                ("[1,8,6,2,5,4,8,3,7]", "49"),
                ("[1,1]", "1"),
                ("[4,3,2,1,4]", "16"),
            ],
            "def max_area(height):\n    left, right = 0, len(height) - 1\n    best = 0\n    while left < right:\n        area = min(height[left], height[right]) * (right - left)\n        best = max(best, area)\n        if height[left] < height[right]:\n            left += 1\n        else:\n            right -= 1\n    return best",
            None,
            "Two pointers from both ends; always move the shorter line inward.",
        ),
        problem(
            "Median of Two Sorted Arrays",
            Difficulty::Hard,
            "Given two sorted arrays `nums1` and `nums2`, return the median of the combined sorted order.",
            GameMode::Standard,
            &[
                ("[1,3]\n[2]", "2.0"),
                ("[1,2]\n[3,4]", "2.5"),
                ("[]\n[1]", "1.0"),
            ],
            "def find_median_sorted_arrays(nums1, nums2):\n    merged = sorted(nums1 + nums2)\n    n = len(merged)\n    if n % 2 == 1:\n        return float(merged[n // 2])\n    return (merged[n // 2 - 1] + merged[n // 2]) / 2",
            None,
            "Merge the arrays and handle the even/odd length split.",
        ),
        problem(
            "Fix the Factorial Function",
            Difficulty::Easy,
            "The following factorial function has bugs. Find and fix all bugs so it returns n!.",
            GameMode::BugHunt,
            &[
                ("5", "120"),
                ("0", "1"),
                ("1", "1"),
                ("3", "6"),
                ("7", "5040"),
            ],
            "def factorial(n):\n    if n == 0:\n        return 1\n    result = 1\n    for i in range(1, n + 1):\n        result *= i\n    return result",
            Some("def factorial(n):\n    if n = 0:\n        return 1\n    result = 1\n    for i in range(1, n):\n        result *= i\n    return result"),
            "Check the base case, loop condition, and multiplication logic.",
        ),
        problem(
            "Debug Array Sum",
            Difficulty::Easy,
            "Fix the bugs in this function that calculates the sum of all elements in an array.",
            GameMode::BugHunt,
            &[
                ("arr = [1, 2, 3, 4, 5]", "15"),
                ("arr = []", "0"),
                ("arr = [10]", "10"),
                ("arr = [-1, 1, 0]", "0"),
            ],
            "def array_sum(arr):\n    total = 0\n    for num in arr:\n        total += num\n    return total",
            Some("def array_sum(arr):\n    total = 0\n    for i in range(len(arr)):\n        total += arr[i+1]\n    return total"),
            "Check array indexing and initialization.",
        ),
        problem(
            "Fix Binary Search",
            Difficulty::Medium,
            "This binary search implementation has multiple bugs. Find and fix them all.",
            GameMode::BugHunt,
            &[
                ("[1,2,3,4,5,6,7]\n4", "3"),
                ("[1,2,3,4,5]\n6", "-1"),
                ("[1]\n1", "0"),
                ("[1,3,5,7,9]\n5", "2"),
            ],
            "def binary_search(arr, target):\n    left, right = 0, len(arr) - 1\n    while left <= right:\n        mid = (left + right) // 2\n        if arr[mid] == target:\n            return mid\n        elif arr[mid] < target:\n            left = mid + 1\n        else:\n            right = mid - 1\n    return -1",
            Some("def binary_search(arr, target):\n    left, right = 0, len(arr)\n    while left < right:\n        mid = (left + right) / 2\n        if arr[mid] = target:\n            return mid\n        elif arr[mid] < target:\n            left = mid\n        else:\n            right = mid\n    return -1"),
            "Check mid calculation, comparison operators, and return values.",
        ),
        problem(
            "Fix Coin Change",
            Difficulty::Hard,
            "Debug this dynamic programming solution for the coin change problem. Return the minimum number of coins needed to make up the amount, or -1.",
            GameMode::BugHunt,
            &[
                ("[1,2,5]\n11", "3"),
                ("[2]\n3", "-1"),
                ("[1]\n0", "0"),
                ("[1,3,4]\n6", "2"),
            ],
            "def coin_change(coins, amount):\n    dp = [float('inf')] * (amount + 1)\n    dp[0] = 0\n    for i in range(1, amount + 1):\n        for coin in coins:\n            if i >= coin:\n                dp[i] = min(dp[i], dp[i - coin] + 1)\n    return dp[amount] if dp[amount] != float('inf') else -1",
            Some("def coin_change(coins, amount):\n    dp = [float('inf')] * amount\n    dp[0] = 0\n    for i in range(1, amount):\n        for coin in coins:\n            if i >= coin:\n                dp[i] = min(dp[i], dp[i - coin])\n    return dp[amount] if dp[amount] != float('inf') else -1"),
            "Check DP initialization, loop boundaries, and update logic.",
        ),
        problem(
            "Reverse String",
            Difficulty::Easy,
            "Rearrange the shuffled lines of code into a function that reverses a string.",
            GameMode::CodeShuffle,
            &[("hello", "olleh"), ("world", "dlrow"), ("a", "a")],
            "def reverse_string(s):\n    result = ''\n    for ch in s:\n        result = ch + result\n    return result",
            None,
            "Build the result by prepending each character.",
        ),
        problem(
            "Find Maximum",
            Difficulty::Easy,
            "Rearrange the shuffled lines of code into a function that returns the largest element of a list.",
            GameMode::CodeShuffle,
            &[("[3,1,4,1,5]", "5"), ("[-2,-7,-1]", "-1"), ("[10]", "10")],
            "def find_max(arr):\n    best = arr[0]\n    for num in arr:\n        if num > best:\n            best = num\n    return best",
            None,
            "Track the best value seen so far.",
        ),
        problem(
            "Valid Parentheses",
            Difficulty::Medium,
            "Rearrange the shuffled lines of code into a function that checks whether a bracket string is balanced.",
            GameMode::CodeShuffle,
            &[("()", "true"), ("([)]", "false"), ("{[]}", "true")],
            "def is_valid(s):\n    pairs = {')': '(', ']': '[', '}': '{'}\n    stack = []\n    for ch in s:\n        if ch in pairs:\n            if not stack or stack.pop() != pairs[ch]:\n                return False\n        else:\n            stack.append(ch)\n    return not stack",
            None,
            "A stack of openers; every closer must match the top.",
        ),
        problem(
            "Fibonacci",
            Difficulty::Medium,
            "Rearrange the shuffled lines of code into a function that returns the nth Fibonacci number.",
            GameMode::CodeShuffle,
            &[("0", "0"), ("1", "1"), ("10", "55")],
            "def fibonacci(n):\n    a, b = 0, 1\n    for _ in range(n):\n        a, b = b, a + b\n    return a",
            None,
            "Iterate with two running values.",
        ),
        problem(
            "Quick Sort",
            Difficulty::Hard,
            "Rearrange the shuffled lines of code into a working quicksort.",
            GameMode::CodeShuffle,
            &[
                ("[5,2,8,1,9]", "[1, 2, 5, 8, 9]"),
                ("[3,1,2]", "[1, 2, 3]"),
                ("[1]", "[1]"),
            ],
            "def quick_sort(arr):\n    if len(arr) <= 1:\n        return arr\n    pivot = arr[0]\n    less = [x for x in arr[1:] if x < pivot]\n    more = [x for x in arr[1:] if x >= pivot]\n    return quick_sort(less) + [pivot] + quick_sort(more)",
            None,
            "Partition around the first element and recurse.",
        ),
    ];

    // One quiz race backed by the built-in question bank
    let mut quiz = problem(
        "Python Rapid Fire",
        Difficulty::Medium,
        "Answer every question before the clock runs out.",
        GameMode::CodeQuiz,
        &[],
        "",
        None,
        "",
    );
    quiz.reference_code.clear();
    quiz.quiz_questions = builtin_questions();
    problems.push(quiz);

    problems
}

fn question(
    prompt: &str,
    code: Option<&str>,
    options: &[&str],
    correct_answer: usize,
    difficulty: Difficulty,
) -> QuizQuestion {
    QuizQuestion {
        prompt: prompt.to_string(),
        code: code.map(str::to_string),
        options: options.iter().map(|o| (*o).to_string()).collect(),
        correct_answer,
        difficulty,
    }
}

fn builtin_questions() -> Vec<QuizQuestion> {
    vec![
        question(
            "What is the output of this code?",
            Some("x = [1, 2, 3]\nprint(len(x))"),
            &["3", "2", "[1, 2, 3]", "Error"],
            0,
            Difficulty::Easy,
        ),
        question(
            "What is wrong with this code?",
            Some("def greet(name)\n    print(f'Hello {name}')"),
            &[
                "Missing colon after function definition",
                "Missing return statement",
                "Wrong indentation",
                "Nothing is wrong",
            ],
            0,
            Difficulty::Easy,
        ),
        question(
            "What is the output of this code?",
            Some("print(3 // 2)"),
            &["1", "1.5", "2", "Error"],
            0,
            Difficulty::Easy,
        ),
        question(
            "What does this code print?",
            Some("d = {'a': 1}\nprint(d.get('b', 0))"),
            &["0", "None", "KeyError", "1"],
            0,
            Difficulty::Medium,
        ),
        question(
            "What is the output of this code?",
            Some("print([i * 2 for i in range(3)])"),
            &["[0, 2, 4]", "[2, 4, 6]", "[0, 1, 2]", "Error"],
            0,
            Difficulty::Medium,
        ),
        question(
            "What does this function return for n = 4?",
            Some("def f(n):\n    return n and f(n - 1) + n or 0"),
            &["10", "4", "0", "RecursionError"],
            0,
            Difficulty::Hard,
        ),
    ]
}
