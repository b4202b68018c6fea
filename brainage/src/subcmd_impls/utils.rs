use agelib::predict::InputSize;

pub fn percentile_legal_range(s: &str) -> Result<f64, String> {
    let q: f64 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a legal percentile"))?;
    if !(0.0..=100.0).contains(&q) {
        return Err(format!("percentile should be in range [0, 100], but got `{q}`"));
    }
    Ok(q)
}

pub fn positive_finite(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a legal number"))?;
    if v.is_nan() || v.is_infinite() || v <= 0.0 {
        return Err(format!("value must be positive and finite, but got `{s}`"));
    }
    Ok(v)
}

pub fn positive_usize(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("value must be at least 1".to_string()),
        Ok(v) => Ok(v),
        Err(_) => Err(format!("`{s}` is not a legal positive integer")),
    }
}

/// 解析`WxH`形式的图像尺寸。
pub fn input_size(s: &str) -> Result<InputSize, String> {
    const ERR: &str = "图像尺寸格式应为`WxH`，如`256x256`";
    let (w, h) = s.split_once(['x', 'X']).ok_or(ERR)?;
    let width: u32 = w.trim().parse().map_err(|_| ERR)?;
    let height: u32 = h.trim().parse().map_err(|_| ERR)?;
    if width == 0 || height == 0 {
        return Err(ERR.to_string());
    }
    Ok(InputSize { width, height })
}
