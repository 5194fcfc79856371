use rand::Rng;
use rand::distr::Alphanumeric;

use super::validate::validate_password;

/// 生成满足密码策略的随机密码（用于初始化管理员）
pub fn generate_random_password(len: usize) -> String {
    let len = len.max(12);
    let mut rng = rand::rng();
    loop {
        let candidate: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();
        if validate_password(&candidate).is_valid {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_passes_policy() {
        for _ in 0..20 {
            let pwd = generate_random_password(16);
            assert_eq!(pwd.len(), 16);
            assert!(validate_password(&pwd).is_valid);
        }
    }
}
