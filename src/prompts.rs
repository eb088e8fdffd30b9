pub const CARTOON_INSTRUCTION: &str = include_str!("../data/prompts/cartoon_instruction.txt");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_is_non_empty() {
        assert!(!CARTOON_INSTRUCTION.trim().is_empty());
    }

    #[test]
    fn test_instruction_asks_for_cartoon() {
        assert!(CARTOON_INSTRUCTION.contains("cartoon"));
    }
}
